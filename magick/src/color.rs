use anyhow::Result;

/// A `RRGGBB` color. It is only ever handed to ImageMagick, so it is kept as
/// text once validated.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Color(String);

impl Color {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `#RRGGBB`, the form ImageMagick expects.
    pub fn hex(&self) -> String {
        format!("#{}", self.0)
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Color {
    type Err = anyhow::Error;

    fn from_str(color: &str) -> Result<Self> {
        anyhow::ensure!(
            color.len() == 6 && color.bytes().all(|b| b.is_ascii_hexdigit()),
            "invalid color {:?}, expected format RRGGBB",
            color
        );
        Ok(Self(color.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_hex() {
        for color in ["336699", "FF0000", "00ff00", "aBcDeF"] {
            let parsed: Color = color.parse().unwrap();
            assert_eq!(parsed.as_str(), color);
        }
        assert_eq!("336699".parse::<Color>().unwrap().hex(), "#336699");
    }

    #[test]
    fn rejects_malformed() {
        for color in ["ZZZZZZ", "#336699", "33669", "3366990", "", "12,456", "１２３４５６"] {
            assert!(color.parse::<Color>().is_err(), "{:?}", color);
        }
    }
}
