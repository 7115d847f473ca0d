use crate::vir::db::errors::DBError;

/// Number of hex characters in an ordinal key suffix. The zero padded
/// lowercase 32 hex format is a cross store contract: every writer must
/// format identically or iteration order breaks silently.
pub const ON_SIZE: usize = 32;

/// Returns key formed by joining top key and the 32 hex conversion of
/// ordinal number on with sep character
pub fn on_key(top: impl AsRef<[u8]>, on: u64, sep: Option<u8>) -> Vec<u8> {
    let top = top.as_ref();
    let sep = sep.unwrap_or(b'.');
    let mut result = Vec::with_capacity(top.len() + 1 + ON_SIZE);
    result.extend_from_slice(top);
    result.push(sep);
    result.extend_from_slice(format!("{:032x}", on).as_bytes());
    result
}

/// Returns key formed by joining pre and the 32 hex conversion of
/// sequence number sn with sep character b"."
pub fn sn_key(pre: impl AsRef<[u8]>, sn: u64) -> Vec<u8> {
    on_key(pre, sn, None)
}

/// Returns key formed by joining pre and the 32 hex conversion of
/// first seen ordinal fn with sep character b"."
pub fn fn_key(pre: impl AsRef<[u8]>, fn_ord: u64) -> Vec<u8> {
    on_key(pre, fn_ord, None)
}

/// Returns bytes DB key from concatenation with b'.' of qualified Base64
/// prefix bytes pre and qualified Base64 digest of serialized event
pub fn dg_key(pre: impl AsRef<[u8]>, dig: impl AsRef<[u8]>) -> Vec<u8> {
    let pre = pre.as_ref();
    let dig = dig.as_ref();
    let mut result = Vec::with_capacity(pre.len() + 1 + dig.len());
    result.extend_from_slice(pre);
    result.push(b'.');
    result.extend_from_slice(dig);
    result
}

/// Returns duple of top and tail by splitting key at the rightmost sep
pub fn split_key(key: impl AsRef<[u8]>, sep: Option<u8>) -> Result<(Vec<u8>, Vec<u8>), DBError> {
    let key = key.as_ref();
    let sep = sep.unwrap_or(b'.');
    let pos = key
        .iter()
        .rposition(|&b| b == sep)
        .ok_or_else(|| DBError::ValueError(format!("Unsplittable key at {}", sep as char)))?;
    Ok((key[..pos].to_vec(), key[pos + 1..].to_vec()))
}

/// Returns duple of top and ordinal int by splitting key at rightmost sep
pub fn split_on_key(key: impl AsRef<[u8]>, sep: Option<u8>) -> Result<(Vec<u8>, u64), DBError> {
    let (top, tail) = split_key(key, sep)?;
    let text = String::from_utf8(tail)
        .map_err(|e| DBError::ParseError(format!("Invalid UTF-8 in ordinal: {}", e)))?;
    let on = u64::from_str_radix(&text, 16)
        .map_err(|e| DBError::ParseError(format!("Invalid hex in ordinal {}: {}", text, e)))?;
    Ok((top, on))
}

/// Returns actual DB key after appending the hidden 32 hex insertion
/// ordering ordinal ion with separator sep
pub fn suffix(key: impl AsRef<[u8]>, ion: u64, sep: Option<u8>) -> Vec<u8> {
    on_key(key, ion, sep)
}

/// Returns duple of apparent key and insertion ordinal by splitting iokey
/// at the rightmost sep
pub fn unsuffix(iokey: impl AsRef<[u8]>, sep: Option<u8>) -> Result<(Vec<u8>, u64), DBError> {
    split_on_key(iokey, sep)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_funcs() {
        let pre = b"BAzwEHHzq7K0gzQPYGGwTmuupUhPx5_yZ-Wk1x4ejhcc".to_vec();
        let dig = b"EGAPkzNZMtX-QiVgbRbyAIZGoXvbGv9IPb0foWTZvI_4".to_vec();

        assert_eq!(
            sn_key(&pre, 3),
            [pre.as_slice(), b".00000000000000000000000000000003"].concat()
        );
        assert_eq!(
            on_key(&pre, 15, Some(b'|')),
            [pre.as_slice(), b"|0000000000000000000000000000000f"].concat()
        );

        assert_eq!(split_on_key(sn_key(&pre, 3), None).unwrap(), (pre.clone(), 3));

        let dgkey = dg_key(&pre, &dig);
        assert_eq!(split_key(&dgkey, None).unwrap(), (pre.clone(), dig.clone()));

        assert!(split_key(b"nosep".to_vec(), None).is_err());
    }

    #[test]
    fn test_suffix_round_trip() {
        let key = b"ABCDEFG.FFFFFF";
        let iokey = suffix(key, 64, None);
        assert_eq!(
            iokey,
            b"ABCDEFG.FFFFFF.00000000000000000000000000000040".to_vec()
        );
        let (k, ion) = unsuffix(&iokey, None).unwrap();
        assert_eq!(k, key.to_vec());
        assert_eq!(ion, 64);
    }
}
