//! Arbitrary-precision decimal values

use crate::error::{Result, SiphonError};

/// Hard cap on stored digits, independent of configurable limits.
const MAX_DIGITS: usize = 65_536;

/// Decimal number with exact representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decimal {
    /// Sign: false = non-negative, true = negative
    pub sign: bool,
    /// ASCII digits '0'..'9', MSB-first, no leading zeros
    pub digits: Vec<u8>,
    /// Base-10 exponent
    pub exponent: i32,
}

impl Decimal {
    /// Parse from the interchange text notation.
    ///
    /// Accepts plain digits with an optional fraction (`123.`, `1.5`,
    /// `-0.5`) and an optional `d`/`D` exponent marker (`1d3`, `1.5d-2`).
    /// Errors carry no byte offset; callers re-anchor with
    /// [`SiphonError::at_offset`].
    pub fn from_text(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SiphonError::decode(0, "empty decimal literal"));
        }

        let (sign, s) = if let Some(stripped) = s.strip_prefix('-') {
            (true, stripped)
        } else {
            (false, s)
        };

        // Split off the exponent marker
        let (mantissa, exponent) = if let Some(d_pos) = s.find(['d', 'D']) {
            let mantissa = &s[..d_pos];
            let exp_str = &s[d_pos + 1..];
            let exp: i32 = exp_str
                .parse()
                .map_err(|_| SiphonError::decode(0, format!("invalid decimal exponent '{exp_str}'")))?;
            (mantissa, exp)
        } else {
            (s, 0)
        };

        let (digits, decimal_places) = Self::parse_mantissa(mantissa)?;
        let final_exponent = exponent - decimal_places as i32;
        let digits = Self::remove_leading_zeros(digits);

        if digits.len() > MAX_DIGITS {
            return Err(SiphonError::decode(0, "too many decimal digits"));
        }

        // Zero is always stored non-negative
        if digits == [b'0'] {
            return Ok(Self {
                sign: false,
                digits,
                exponent: final_exponent,
            });
        }

        Ok(Self {
            sign,
            digits,
            exponent: final_exponent,
        })
    }

    /// Parse mantissa and return (digits, decimal_places)
    fn parse_mantissa(s: &str) -> Result<(Vec<u8>, usize)> {
        let mut digits = Vec::new();
        let mut decimal_places = 0;
        let mut found_dot = false;

        for ch in s.chars() {
            match ch {
                '0'..='9' => {
                    digits.push(ch as u8);
                    if found_dot {
                        decimal_places += 1;
                    }
                }
                '.' => {
                    if found_dot {
                        return Err(SiphonError::decode(0, "decimal with two fraction points"));
                    }
                    found_dot = true;
                }
                other => {
                    return Err(SiphonError::decode(
                        0,
                        format!("unexpected character '{other}' in decimal"),
                    ));
                }
            }
        }

        if digits.is_empty() {
            return Err(SiphonError::decode(0, "decimal without digits"));
        }

        Ok((digits, decimal_places))
    }

    /// Remove leading zeros (except for "0" itself)
    fn remove_leading_zeros(mut digits: Vec<u8>) -> Vec<u8> {
        while digits.len() > 1 && digits[0] == b'0' {
            digits.remove(0);
        }
        if digits.is_empty() {
            digits.push(b'0');
        }
        digits
    }

    /// Render as a JSON-compatible number string.
    ///
    /// Uses plain decimal notation for small exponents and scientific
    /// notation beyond that, without losing digits either way.
    pub fn to_json_string(&self) -> String {
        if self.digits == [b'0'] {
            return "0".to_string();
        }

        let mut result = String::new();

        if self.sign {
            result.push('-');
        }

        if self.exponent.abs() > 6 {
            result.push_str(&String::from_utf8_lossy(&self.digits));
            let mut exponent = self.exponent as i64;
            if self.digits.len() > 1 {
                let insert_pos = if self.sign { 2 } else { 1 };
                result.insert(insert_pos, '.');
                exponent += (self.digits.len() as i64) - 1;
            }
            result.push('e');
            result.push_str(&exponent.to_string());
        } else if self.exponent >= 0 {
            result.push_str(&String::from_utf8_lossy(&self.digits));
            for _ in 0..self.exponent {
                result.push('0');
            }
        } else {
            let exp = (-self.exponent) as usize;
            if exp < self.digits.len() {
                let (int_part, frac_part) = self.digits.split_at(self.digits.len() - exp);
                result.push_str(&String::from_utf8_lossy(int_part));
                result.push('.');
                result.push_str(&String::from_utf8_lossy(frac_part));
            } else {
                result.push('0');
                result.push('.');
                for _ in 0..(exp - self.digits.len()) {
                    result.push('0');
                }
                result.push_str(&String::from_utf8_lossy(&self.digits));
            }
        }

        result
    }
}
