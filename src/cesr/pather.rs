use crate::cesr::{decode_b64, encode_b64, mtr_dex, sizes, BaseMatter, Matter, Parsable};
use crate::errors::MatterError;
use serde_json::Value;

/// Pather is Matter subclass for a path over a self-addressing document,
/// rendered as a fully qualified variable sized Base64 primitive.
///
/// The path text joins parts with '-', so path ["a", "b"] has text "-a-b"
/// and the empty path has text "-". Numeric parts index into lists or into
/// a field map by field position. Because the text is pre-padded with 'A'
/// chars to reach quadlet alignment, a path part with a leading 'A' whose
/// text length is a multiple of four may not round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pather {
    base: BaseMatter,
}

impl Pather {
    /// Creates a Pather from path parts
    pub fn new(path: &[&str]) -> Result<Self, MatterError> {
        for part in path {
            if part.contains('-') {
                return Err(MatterError::ValueError(format!(
                    "Invalid path part = {}",
                    part
                )));
            }
        }
        let mut text = String::from("-");
        text.push_str(&path.join("-"));
        Self::from_text(&text)
    }

    /// Creates a Pather from path text such as "-a-b"
    pub fn from_text(text: &str) -> Result<Self, MatterError> {
        let ts = text.len() % 4;
        let ws = (4 - ts) % 4; // pre conversion wad of 'A' chars
        let ls = (3 - (ts % 3)) % 3; // post conversion lead bytes
        let mut base = "A".repeat(ws);
        base.push_str(text);
        let paw = decode_b64(&base)?;
        let raw = &paw[ls..];
        let code = match ls {
            0 => mtr_dex::STR_B64_L0,
            1 => mtr_dex::STR_B64_L1,
            _ => mtr_dex::STR_B64_L2,
        };
        Ok(Self {
            base: BaseMatter::new(raw, code)?,
        })
    }

    /// Creates a Pather from a qb64 string
    pub fn from_qb64(qb64: &str) -> Result<Self, MatterError> {
        let base = BaseMatter::from_qb64(qb64)?;
        if sizes(base.code())?.fs.is_some() {
            return Err(MatterError::InvalidCode(base.code().to_string()));
        }
        Ok(Self { base })
    }

    /// Returns the path text
    pub fn text(&self) -> String {
        let szg = match sizes(self.base.code()) {
            Ok(szg) => szg,
            Err(_) => return String::new(),
        };
        let mut wad = vec![0u8; szg.ls];
        wad.extend_from_slice(self.base.raw());
        let bext = encode_b64(&wad);
        let ws = if szg.ls == 0 {
            usize::from(bext.starts_with('A'))
        } else {
            (szg.ls + 1) % 4
        };
        bext[ws..].to_string()
    }

    /// Returns the path parts
    pub fn parts(&self) -> Vec<String> {
        self.text()
            .split('-')
            .skip(1)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Returns a new Pather with this path re-rooted under root
    pub fn root(&self, root: &Pather) -> Result<Pather, MatterError> {
        let mut parts = root.parts();
        parts.extend(self.parts());
        let refs: Vec<&str> = parts.iter().map(String::as_str).collect();
        Pather::new(&refs)
    }

    /// Resolves this path against a serializable attribute dictionary,
    /// returning the referenced value
    pub fn resolve<'a>(&self, sad: &'a Value) -> Result<&'a Value, MatterError> {
        let mut cur = sad;
        for part in self.parts() {
            cur = if let Ok(idx) = part.parse::<usize>() {
                match cur {
                    Value::Array(items) => items.get(idx),
                    Value::Object(map) => map.values().nth(idx),
                    _ => None,
                }
            } else {
                cur.get(&part)
            }
            .ok_or_else(|| {
                MatterError::ValueError(format!("Unresolvable path part = {}", part))
            })?;
        }
        Ok(cur)
    }
}

impl Matter for Pather {
    fn code(&self) -> &str {
        self.base.code()
    }
    fn raw(&self) -> &[u8] {
        self.base.raw()
    }
    fn qb64(&self) -> String {
        self.base.qb64()
    }
}

impl Parsable for Pather {
    fn from_qb64b(data: &mut Vec<u8>, strip: Option<bool>) -> Result<Self, MatterError> {
        Ok(Self {
            base: BaseMatter::from_qb64b(data, strip)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pather_text_round_trip() {
        let pather = Pather::new(&["a"]).unwrap();
        assert_eq!(pather.text(), "-a");
        assert_eq!(pather.parts(), vec!["a".to_string()]);
        assert_eq!(pather.qb64().len() % 4, 0);

        let again = Pather::from_qb64(&pather.qb64()).unwrap();
        assert_eq!(again.text(), "-a");

        let pather = Pather::new(&["a", "b", "0"]).unwrap();
        assert_eq!(pather.text(), "-a-b-0");
        let again = Pather::from_qb64(&pather.qb64()).unwrap();
        assert_eq!(again.parts(), vec!["a", "b", "0"]);

        let empty = Pather::new(&[]).unwrap();
        assert_eq!(empty.text(), "-");
        assert!(empty.parts().is_empty());
    }

    #[test]
    fn test_pather_root() {
        let pather = Pather::new(&["b"]).unwrap();
        let root = Pather::new(&["a"]).unwrap();
        let rooted = pather.root(&root).unwrap();
        assert_eq!(rooted.text(), "-a-b");
    }

    #[test]
    fn test_pather_resolve() {
        let sad = json!({
            "v": "KERI10JSON000000_",
            "a": {"i": "EAAA", "items": ["x", "y"]},
        });
        let pather = Pather::new(&["a", "i"]).unwrap();
        assert_eq!(pather.resolve(&sad).unwrap(), "EAAA");

        let pather = Pather::new(&["a", "items", "1"]).unwrap();
        assert_eq!(pather.resolve(&sad).unwrap(), "y");

        // numeric part indexes field maps by position
        let pather = Pather::new(&["1"]).unwrap();
        assert_eq!(pather.resolve(&sad).unwrap(), &sad["a"]);

        let missing = Pather::new(&["q"]).unwrap();
        assert!(missing.resolve(&sad).is_err());
    }
}
