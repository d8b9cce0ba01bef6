//! FITS header parsing.
//!
//! A header is a run of 80-byte ASCII cards terminated by `END` and padded
//! with blanks to a 2880-byte block boundary. Value cards carry `= ` in
//! columns 9-10 followed by the value and an optional `/ comment`.

use crate::{FitsError, FitsResult, BLOCK_SIZE, CARD_SIZE};

/// A parsed card value.
#[derive(Debug, Clone, PartialEq)]
pub enum CardValue {
    Logical(bool),
    Integer(i64),
    Real(f64),
    Str(String),
}

impl CardValue {
    fn type_name(&self) -> &'static str {
        match self {
            CardValue::Logical(_) => "logical",
            CardValue::Integer(_) => "integer",
            CardValue::Real(_) => "real",
            CardValue::Str(_) => "string",
        }
    }
}

/// One header card that carries a value.
#[derive(Debug, Clone)]
pub struct Card {
    pub keyword: String,
    pub value: CardValue,
}

/// A parsed HDU header.
#[derive(Debug, Clone, Default)]
pub struct Header {
    cards: Vec<Card>,
}

impl Header {
    /// Parse a header starting at the beginning of `bytes`.
    ///
    /// Returns the header and the number of bytes it occupies including
    /// block padding.
    pub fn parse(bytes: &[u8]) -> FitsResult<(Header, usize)> {
        let mut cards = Vec::new();
        let mut offset = 0;

        loop {
            if offset + CARD_SIZE > bytes.len() {
                return Err(FitsError::Truncated(
                    "header ended without END card".to_string(),
                ));
            }

            let raw = &bytes[offset..offset + CARD_SIZE];
            offset += CARD_SIZE;

            let keyword = std::str::from_utf8(&raw[0..8])
                .map_err(|_| FitsError::InvalidCard("keyword is not ASCII".to_string()))?
                .trim_end()
                .to_string();

            if keyword == "END" {
                break;
            }

            // COMMENT, HISTORY, blank keywords, and anything without the
            // value indicator are carried in the file but not needed here.
            if &raw[8..10] != b"= " {
                continue;
            }

            let value = parse_value(&raw[10..])?;
            cards.push(Card { keyword, value });
        }

        // Consume the blank padding up to the next block boundary.
        let header_len = offset.div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
        if header_len > bytes.len() {
            return Err(FitsError::Truncated(
                "header padding runs past end of file".to_string(),
            ));
        }

        Ok((Header { cards }, header_len))
    }

    fn find(&self, keyword: &str) -> Option<&CardValue> {
        self.cards
            .iter()
            .find(|c| c.keyword == keyword)
            .map(|c| &c.value)
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.find(keyword).is_some()
    }

    pub fn integer(&self, keyword: &str) -> FitsResult<i64> {
        match self.find(keyword) {
            Some(CardValue::Integer(v)) => Ok(*v),
            Some(other) => Err(FitsError::WrongType {
                keyword: keyword.to_string(),
                found: other.type_name().to_string(),
            }),
            None => Err(FitsError::MissingKeyword(keyword.to_string())),
        }
    }

    /// Real-valued keyword; integer cards widen, since writers emit
    /// `BZERO = 32768` and `BZERO = 32768.0` interchangeably.
    pub fn real(&self, keyword: &str) -> FitsResult<f64> {
        match self.find(keyword) {
            Some(CardValue::Real(v)) => Ok(*v),
            Some(CardValue::Integer(v)) => Ok(*v as f64),
            Some(other) => Err(FitsError::WrongType {
                keyword: keyword.to_string(),
                found: other.type_name().to_string(),
            }),
            None => Err(FitsError::MissingKeyword(keyword.to_string())),
        }
    }

    pub fn logical(&self, keyword: &str) -> FitsResult<bool> {
        match self.find(keyword) {
            Some(CardValue::Logical(v)) => Ok(*v),
            Some(other) => Err(FitsError::WrongType {
                keyword: keyword.to_string(),
                found: other.type_name().to_string(),
            }),
            None => Err(FitsError::MissingKeyword(keyword.to_string())),
        }
    }

    pub fn string(&self, keyword: &str) -> FitsResult<&str> {
        match self.find(keyword) {
            Some(CardValue::Str(v)) => Ok(v),
            Some(other) => Err(FitsError::WrongType {
                keyword: keyword.to_string(),
                found: other.type_name().to_string(),
            }),
            None => Err(FitsError::MissingKeyword(keyword.to_string())),
        }
    }

    /// Axis lengths NAXIS1..NAXISn.
    pub fn axes(&self) -> FitsResult<Vec<usize>> {
        let naxis = self.integer("NAXIS")?;
        (1..=naxis)
            .map(|i| {
                let len = self.integer(&format!("NAXIS{}", i))?;
                usize::try_from(len).map_err(|_| FitsError::InvalidCard(format!(
                    "NAXIS{} is negative: {}",
                    i, len
                )))
            })
            .collect()
    }

    /// Size in bytes of the data area this header describes, excluding
    /// block padding.
    ///
    /// Per the standard: |BITPIX|/8 × GCOUNT × (PCOUNT + NAXIS1 × … × NAXISn),
    /// with GCOUNT defaulting to 1 and PCOUNT to 0, and zero when NAXIS = 0.
    pub fn data_area_len(&self) -> FitsResult<usize> {
        let axes = self.axes()?;
        if axes.is_empty() {
            return Ok(0);
        }

        let bitpix = self.integer("BITPIX")?;
        let bytes_per_value = (bitpix.unsigned_abs() as usize) / 8;

        let gcount = self.integer("GCOUNT").unwrap_or(1).max(0) as usize;
        let pcount = self.integer("PCOUNT").unwrap_or(0).max(0) as usize;

        let nelem: usize = axes.iter().product();
        Ok(bytes_per_value * gcount * (pcount + nelem))
    }
}

/// Parse the value portion of a card (everything after `= `).
fn parse_value(raw: &[u8]) -> FitsResult<CardValue> {
    let text = std::str::from_utf8(raw)
        .map_err(|_| FitsError::InvalidCard("value is not ASCII".to_string()))?;

    let trimmed = text.trim_start();
    if let Some(rest) = trimmed.strip_prefix('\'') {
        // Quoted string; '' is an escaped quote.
        let mut value = String::new();
        let mut chars = rest.chars().peekable();
        loop {
            match chars.next() {
                Some('\'') => {
                    if chars.peek() == Some(&'\'') {
                        chars.next();
                        value.push('\'');
                    } else {
                        break;
                    }
                }
                Some(c) => value.push(c),
                None => {
                    return Err(FitsError::InvalidCard(format!(
                        "unterminated string value: {}",
                        text.trim()
                    )))
                }
            }
        }
        // Trailing blanks inside the quotes are not significant.
        return Ok(CardValue::Str(value.trim_end().to_string()));
    }

    // Strip the inline comment, then parse the bare token.
    let token = trimmed.split('/').next().unwrap_or("").trim();
    match token {
        "" => Err(FitsError::InvalidCard("empty value".to_string())),
        "T" => Ok(CardValue::Logical(true)),
        "F" => Ok(CardValue::Logical(false)),
        _ => {
            if let Ok(v) = token.parse::<i64>() {
                Ok(CardValue::Integer(v))
            } else if let Ok(v) = parse_fits_real(token) {
                Ok(CardValue::Real(v))
            } else {
                Err(FitsError::InvalidCard(format!("unparseable value: {}", token)))
            }
        }
    }
}

/// FITS allows `D` as the exponent marker for double precision.
fn parse_fits_real(token: &str) -> Result<f64, std::num::ParseFloatError> {
    token.replace(['D', 'd'], "E").parse::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build one 80-byte card from a short text.
    fn card(text: &str) -> Vec<u8> {
        let mut bytes = text.as_bytes().to_vec();
        assert!(bytes.len() <= CARD_SIZE);
        bytes.resize(CARD_SIZE, b' ');
        bytes
    }

    /// Assemble cards plus END into a padded header block.
    fn header_block(cards: &[&str]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for c in cards {
            bytes.extend_from_slice(&card(c));
        }
        bytes.extend_from_slice(&card("END"));
        bytes.resize(bytes.len().div_ceil(BLOCK_SIZE) * BLOCK_SIZE, b' ');
        bytes
    }

    #[test]
    fn test_parse_minimal_primary_header() {
        let bytes = header_block(&[
            "SIMPLE  =                    T / conforms to FITS standard",
            "BITPIX  =                    8",
            "NAXIS   =                    0",
        ]);
        let (header, len) = Header::parse(&bytes).unwrap();
        assert_eq!(len, BLOCK_SIZE);
        assert!(header.logical("SIMPLE").unwrap());
        assert_eq!(header.integer("BITPIX").unwrap(), 8);
        assert_eq!(header.data_area_len().unwrap(), 0);
    }

    #[test]
    fn test_parse_image_extension_header() {
        let bytes = header_block(&[
            "XTENSION= 'IMAGE   '           / IMAGE extension",
            "BITPIX  =                  -32",
            "NAXIS   =                    2",
            "NAXIS1  =                  548",
            "NAXIS2  =                  370",
            "PCOUNT  =                    0",
            "GCOUNT  =                    1",
            "BSCALE  =                  1.0",
            "BZERO   =                  0.0",
        ]);
        let (header, _) = Header::parse(&bytes).unwrap();
        assert_eq!(header.string("XTENSION").unwrap(), "IMAGE");
        assert_eq!(header.axes().unwrap(), vec![548, 370]);
        assert_eq!(header.data_area_len().unwrap(), 4 * 548 * 370);
    }

    #[test]
    fn test_string_value_with_escaped_quote() {
        let bytes = header_block(&["OBJECT  = 'O''NEILL '"]);
        let (header, _) = Header::parse(&bytes).unwrap();
        assert_eq!(header.string("OBJECT").unwrap(), "O'NEILL");
    }

    #[test]
    fn test_real_with_fortran_exponent() {
        let bytes = header_block(&["USFLUX  =           1.1527D+22"]);
        let (header, _) = Header::parse(&bytes).unwrap();
        assert!((header.real("USFLUX").unwrap() - 1.1527e22).abs() < 1e18);
    }

    #[test]
    fn test_integer_widens_to_real() {
        let bytes = header_block(&["BZERO   =                32768"]);
        let (header, _) = Header::parse(&bytes).unwrap();
        assert_eq!(header.real("BZERO").unwrap(), 32768.0);
        assert_eq!(header.integer("BZERO").unwrap(), 32768);
    }

    #[test]
    fn test_comment_cards_skipped() {
        let bytes = header_block(&[
            "SIMPLE  =                    T",
            "COMMENT this card has no value indicator",
            "HISTORY neither does this one",
            "BITPIX  =                   16",
            "NAXIS   =                    0",
        ]);
        let (header, _) = Header::parse(&bytes).unwrap();
        assert_eq!(header.integer("BITPIX").unwrap(), 16);
        assert!(!header.contains("COMMENT"));
    }

    #[test]
    fn test_missing_end_is_truncated() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&card("SIMPLE  =                    T"));
        // No END, no padding.
        assert!(matches!(
            Header::parse(&bytes),
            Err(FitsError::Truncated(_))
        ));
    }

    #[test]
    fn test_wrong_type_reported() {
        let bytes = header_block(&["BITPIX  = 'sixteen '"]);
        let (header, _) = Header::parse(&bytes).unwrap();
        assert!(matches!(
            header.integer("BITPIX"),
            Err(FitsError::WrongType { .. })
        ));
    }
}
