// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

/// A 20-byte host-generated record identifier.
///
/// Digests identify sub-records. They are minted by the host when a
/// sub-record is created and are opaque to the engine; persisted `Value`
/// trees carry them in their hex string form, which is also the form the
/// host's open call accepts.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; 20]);

impl Digest {
    /// Wraps raw digest bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Returns the raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Digest {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 40 || !s.is_ascii() {
            return Err(crate::Error::BinDamaged("malformed digest string"));
        }

        let mut bytes = [0u8; 20];

        for (idx, chunk) in s.as_bytes().chunks_exact(2).enumerate() {
            let hex = std::str::from_utf8(chunk)
                .map_err(|_| crate::Error::BinDamaged("malformed digest string"))?;

            *bytes
                .get_mut(idx)
                .ok_or(crate::Error::BinDamaged("malformed digest string"))? =
                u8::from_str_radix(hex, 16)
                    .map_err(|_| crate::Error::BinDamaged("malformed digest string"))?;
        }

        Ok(Self(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn hex_round_trip() -> crate::Result<()> {
        let mut bytes = [0u8; 20];
        for (idx, byte) in bytes.iter_mut().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            {
                *byte = idx as u8;
            }
        }

        let digest = Digest::from_bytes(bytes);
        let parsed: Digest = digest.to_string().parse()?;

        assert_eq!(digest, parsed);
        Ok(())
    }

    #[test]
    fn rejects_malformed() {
        assert!("zz".parse::<Digest>().is_err());
        assert!("f00".parse::<Digest>().is_err());
    }
}
