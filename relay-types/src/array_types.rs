use core::{
    borrow::{Borrow, BorrowMut},
    convert::TryFrom,
    fmt,
    ops::{Deref, DerefMut},
    str,
};

/// Error parsing a fixed-width byte array from its textual form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseBytesError;

impl fmt::Display for ParseBytesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse bytes from hex string")
    }
}

impl std::error::Error for ParseBytesError {}

macro_rules! key {
    ($i:ident, $s:expr, $doc:expr) => {
        #[doc = $doc]
        #[derive(Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        pub struct $i([u8; $s]);

        key_methods!($i, $s);
    };
}

macro_rules! key_methods {
    ($i:ident, $s:expr) => {
        impl $i {
            /// Memory length of the type in bytes.
            pub const LEN: usize = $s;

            /// Bytes constructor.
            pub const fn new(bytes: [u8; $s]) -> Self {
                Self(bytes)
            }

            /// Zeroed bytes constructor.
            pub const fn zeroed() -> $i {
                $i([0; $s])
            }

            /// Whether every byte of the array is zero.
            pub fn is_zero(&self) -> bool {
                self.0 == [0; $s]
            }
        }

        impl Deref for $i {
            type Target = [u8; $s];

            fn deref(&self) -> &[u8; $s] {
                &self.0
            }
        }

        impl DerefMut for $i {
            fn deref_mut(&mut self) -> &mut [u8; $s] {
                &mut self.0
            }
        }

        impl Borrow<[u8; $s]> for $i {
            fn borrow(&self) -> &[u8; $s] {
                &self.0
            }
        }

        impl BorrowMut<[u8; $s]> for $i {
            fn borrow_mut(&mut self) -> &mut [u8; $s] {
                &mut self.0
            }
        }

        impl AsRef<[u8]> for $i {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl AsMut<[u8]> for $i {
            fn as_mut(&mut self) -> &mut [u8] {
                &mut self.0
            }
        }

        impl From<[u8; $s]> for $i {
            fn from(bytes: [u8; $s]) -> Self {
                Self(bytes)
            }
        }

        impl From<$i> for [u8; $s] {
            fn from(value: $i) -> [u8; $s] {
                value.0
            }
        }

        impl TryFrom<&[u8]> for $i {
            type Error = ParseBytesError;

            fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
                <[u8; $s]>::try_from(bytes)
                    .map(Self)
                    .map_err(|_| ParseBytesError)
            }
        }

        impl fmt::LowerHex for $i {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if f.alternate() {
                    write!(f, "0x")?;
                }
                for byte in self.0.iter() {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
        }

        impl fmt::UpperHex for $i {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if f.alternate() {
                    write!(f, "0x")?;
                }
                for byte in self.0.iter() {
                    write!(f, "{:02X}", byte)?;
                }
                Ok(())
            }
        }

        impl fmt::Debug for $i {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:#x})", stringify!($i), self)
            }
        }

        impl fmt::Display for $i {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:#x}", self)
            }
        }

        impl str::FromStr for $i {
            type Err = ParseBytesError;

            /// Parse from hex, with or without a `0x` prefix.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.strip_prefix("0x").unwrap_or(s);
                let mut bytes = [0u8; $s];
                hex::decode_to_slice(s, &mut bytes).map_err(|_| ParseBytesError)?;
                Ok(Self(bytes))
            }
        }

        impl serde::Serialize for $i {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.collect_str(&format_args!("{:#x}", self))
            }
        }

        impl<'de> serde::Deserialize<'de> for $i {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = <String as serde::Deserialize>::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

key!(Hash, 32, "A 32-byte digest of the system hash.");
key!(
    ElemBytes,
    32,
    "The atomic 32-byte field of a leaf payload slot."
);

impl From<ElemBytes> for Hash {
    fn from(e: ElemBytes) -> Self {
        Hash::new(*e)
    }
}

impl From<Hash> for ElemBytes {
    fn from(h: Hash) -> Self {
        ElemBytes::new(*h)
    }
}
