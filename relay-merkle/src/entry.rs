use crate::hash::sum_many;

use relay_types::{ElemBytes, Hash};

use core::{
    fmt,
    ops::{Index, IndexMut},
    str,
};

/// A leaf payload: four 32-byte slots, 128 bytes total.
///
/// Slots `Data[2]` and `Data[3]` are the index of the leaf (`Data[3]` carries
/// the claim header in its trailing bytes); slots `Data[0]` and `Data[1]` are
/// the value. The serialized form is `Data[0] ‖ Data[1] ‖ Data[2] ‖ Data[3]`.
#[derive(Default, Clone, Copy, PartialEq, Eq)]
pub struct Data([ElemBytes; 4]);

impl Data {
    /// Number of slots.
    pub const SLOTS: usize = 4;

    /// Serialized length in bytes.
    pub const LEN: usize = Self::SLOTS * ElemBytes::LEN;

    pub const fn new(slots: [ElemBytes; 4]) -> Self {
        Self(slots)
    }

    /// Serialize the four slots in order.
    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let mut bytes = [0u8; Self::LEN];
        for (i, slot) in self.0.iter().enumerate() {
            bytes[i * ElemBytes::LEN..(i + 1) * ElemBytes::LEN].copy_from_slice(&**slot);
        }
        bytes
    }

    pub fn from_bytes(bytes: &[u8; Self::LEN]) -> Self {
        let mut slots = [ElemBytes::zeroed(); 4];
        for (i, slot) in slots.iter_mut().enumerate() {
            slot.copy_from_slice(&bytes[i * ElemBytes::LEN..(i + 1) * ElemBytes::LEN]);
        }
        Self(slots)
    }
}

impl Index<usize> for Data {
    type Output = ElemBytes;

    fn index(&self, index: usize) -> &ElemBytes {
        &self.0[index]
    }
}

impl IndexMut<usize> for Data {
    fn index_mut(&mut self, index: usize) -> &mut ElemBytes {
        &mut self.0[index]
    }
}

impl fmt::LowerHex for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x")?;
        }
        for byte in self.to_bytes() {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Data({:#x})", self)
    }
}

impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self)
    }
}

impl str::FromStr for Data {
    type Err = relay_types::ParseBytesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; Self::LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| relay_types::ParseBytesError)?;
        Ok(Self::from_bytes(&bytes))
    }
}

impl serde::Serialize for Data {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&format_args!("{:#x}", self))
    }
}

impl<'de> serde::Deserialize<'de> for Data {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A tree entry: a [`Data`] record plus its derived index and value hashes.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Entry {
    pub data: Data,
}

impl Entry {
    pub const fn new(data: Data) -> Self {
        Self { data }
    }

    /// Hash of the index slots; the key of the leaf in the tree.
    pub fn hindex(&self) -> Hash {
        sum_many([self.data[2].as_ref(), self.data[3].as_ref()])
    }

    /// Hash of the value slots; the value committed at the leaf position.
    pub fn hvalue(&self) -> Hash {
        sum_many([self.data[0].as_ref(), self.data[1].as_ref()])
    }

    /// Serialized payload, as signed by claim holders.
    pub fn bytes(&self) -> [u8; Data::LEN] {
        self.data.to_bytes()
    }
}

impl From<Data> for Entry {
    fn from(data: Data) -> Self {
        Self::new(data)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample() -> Data {
        let mut data = Data::default();
        data[0][0] = 0xaa;
        data[1][31] = 0xbb;
        data[2][0] = 0xcc;
        data[3][31] = 0xdd;
        data
    }

    #[test]
    fn data_round_trips_through_bytes() {
        let data = sample();
        assert_eq!(Data::from_bytes(&data.to_bytes()), data);
    }

    #[test]
    fn data_round_trips_through_hex() {
        let data = sample();
        let s = data.to_string();
        assert!(s.starts_with("0x"));
        assert_eq!(s.len(), 2 + Data::LEN * 2);
        assert_eq!(s.parse::<Data>().unwrap(), data);
    }

    #[test]
    fn hindex_covers_only_index_slots() {
        let mut a = sample();
        let b = a;
        // Changing a value slot must not move the leaf.
        a[0][5] = 0x11;
        assert_eq!(Entry::new(a).hindex(), Entry::new(b).hindex());
        assert_ne!(Entry::new(a).hvalue(), Entry::new(b).hvalue());

        // Changing an index slot must move the leaf.
        let mut c = b;
        c[3][20] = 0x22;
        assert_ne!(Entry::new(c).hindex(), Entry::new(b).hindex());
        assert_eq!(Entry::new(c).hvalue(), Entry::new(b).hvalue());
    }
}
