//! Fixed-size code types shared by every table, stay, and result in this
//! workspace. All of them are `Copy`, hashable, orderable, and carry no
//! heap allocation, so they can sit in hot classification loops without
//! cloning or interning.

use std::fmt;

use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

/// Patient sex, as recorded on a stay.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Sex {
    Male = 1,
    Female = 2,
}

impl Sex {
    pub fn from_u8(value: u8) -> Option<Sex> {
        match value {
            1 => Some(Sex::Male),
            2 => Some(Sex::Female),
            _ => None,
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
        })
    }
}

fn upper_ascii(c: u8) -> u8 {
    c.to_ascii_uppercase()
}

/// Root GHM code: command (0-99), type letter, and a sequence number within
/// that command/type, e.g. `04C02`.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GhmRootCode {
    pub cmd: u8,
    pub kind: u8,
    pub seq: u8,
}

impl GhmRootCode {
    pub fn is_valid(self) -> bool {
        self.cmd != 0 || self.kind != 0 || self.seq != 0
    }

    /// The "error root" CMD 90 used for un-groupable stays.
    pub fn is_error(self) -> bool {
        self.cmd == 90
    }

    pub fn parse(s: &str) -> Option<GhmRootCode> {
        let bytes = s.as_bytes();
        if bytes.len() != 5 {
            return None;
        }
        let cmd = parse_two_digits(&bytes[0..2])?;
        let kind = upper_ascii(bytes[2]);
        if !kind.is_ascii_uppercase() {
            return None;
        }
        let seq = parse_two_digits(&bytes[3..5])?;
        Some(GhmRootCode { cmd, kind, seq })
    }
}

impl fmt::Display for GhmRootCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}{}{:02}",
            self.cmd, self.kind as char, self.seq
        )
    }
}

impl fmt::Debug for GhmRootCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GhmRootCode({})", self)
    }
}

/// Full GHM code: a root code plus a severity/mode letter or digit
/// (`1`-`4` for medical roots, `A`-`D` for surgical/obstetric roots).
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GhmCode {
    pub cmd: u8,
    pub kind: u8,
    pub seq: u8,
    pub mode: u8,
}

impl GhmCode {
    pub fn is_valid(self) -> bool {
        self.cmd != 0 || self.kind != 0 || self.seq != 0 || self.mode != 0
    }

    pub fn is_error(self) -> bool {
        self.cmd == 90
    }

    pub fn root(self) -> GhmRootCode {
        GhmRootCode {
            cmd: self.cmd,
            kind: self.kind,
            seq: self.seq,
        }
    }

    /// Severity level 0-3 encoded in the mode letter/digit; 0 for modes
    /// that carry no severity information (e.g. mode `Z`, mode `J`).
    pub fn severity(self) -> u8 {
        match self.mode {
            b'1'..=b'4' => self.mode - b'1',
            b'A'..=b'D' => self.mode - b'A',
            _ => 0,
        }
    }

    pub fn parse(s: &str) -> Option<GhmCode> {
        let bytes = s.as_bytes();
        if bytes.len() != 6 {
            return None;
        }
        let cmd = parse_two_digits(&bytes[0..2])?;
        let kind = upper_ascii(bytes[2]);
        if !kind.is_ascii_uppercase() {
            return None;
        }
        let seq = parse_two_digits(&bytes[3..5])?;
        let mode = bytes[5];
        Some(GhmCode {
            cmd,
            kind,
            seq,
            mode,
        })
    }
}

impl fmt::Display for GhmCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}{}{:02}{}",
            self.cmd, self.kind as char, self.seq, self.mode as char
        )
    }
}

impl fmt::Debug for GhmCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GhmCode({})", self)
    }
}

fn parse_two_digits(bytes: &[u8]) -> Option<u8> {
    let tens = bytes[0].checked_sub(b'0')?;
    let ones = bytes[1].checked_sub(b'0')?;
    if tens > 9 || ones > 9 {
        return None;
    }
    Some(tens * 10 + ones)
}

const DIAGNOSIS_LEN: usize = 6;

/// ICD-10 diagnosis code, stored canonicalized (uppercased, trailing `+`
/// padding stripped) in a fixed 6-byte buffer.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DiagnosisCode {
    bytes: [u8; DIAGNOSIS_LEN],
}

impl DiagnosisCode {
    pub fn is_valid(self) -> bool {
        self.bytes[0] != 0
    }

    pub fn as_str(&self) -> &str {
        let len = self.bytes.iter().position(|&b| b == 0).unwrap_or(DIAGNOSIS_LEN);
        std::str::from_utf8(&self.bytes[..len]).unwrap_or("")
    }

    /// Left-to-right prefix match, e.g. a 3-character exclusion entry
    /// matching any longer code that shares its first three characters.
    pub fn matches(self, other: DiagnosisCode) -> bool {
        let a = self.as_str();
        let b = other.as_str();
        a.len() <= b.len() && b.starts_with(a)
    }

    pub fn parse(s: &str) -> Option<DiagnosisCode> {
        let mut buf = [0u8; DIAGNOSIS_LEN];
        let mut len = 0usize;
        for &c in s.as_bytes() {
            if len >= DIAGNOSIS_LEN || c == b' ' {
                break;
            }
            buf[len] = upper_ascii(c);
            len += 1;
        }
        if len == 0 {
            return None;
        }
        if !buf[0].is_ascii_alphabetic() || !buf[1].is_ascii_digit() || !buf[2].is_ascii_digit() {
            return None;
        }
        let mut end = 3;
        while end < len {
            let c = buf[end];
            let ok = c.is_ascii_digit() || (end < 5 && c == b'+');
            if !ok {
                return None;
            }
            end += 1;
        }
        while end > 3 && buf[end - 1] == b'+' {
            buf[end - 1] = 0;
            end -= 1;
        }
        Some(DiagnosisCode { bytes: buf })
    }
}

impl fmt::Display for DiagnosisCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for DiagnosisCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DiagnosisCode({})", self.as_str())
    }
}

const PROCEDURE_LEN: usize = 7;

/// CCAM procedure code: exactly 4 letters followed by 3 digits.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcedureCode {
    bytes: [u8; PROCEDURE_LEN],
}

impl ProcedureCode {
    pub fn is_valid(self) -> bool {
        self.bytes[0] != 0
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes).unwrap_or("")
    }

    pub fn parse(s: &str) -> Option<ProcedureCode> {
        let bytes = s.as_bytes();
        if bytes.len() != PROCEDURE_LEN {
            return None;
        }
        let mut buf = [0u8; PROCEDURE_LEN];
        for (i, &c) in bytes.iter().enumerate() {
            buf[i] = upper_ascii(c);
        }
        let valid = buf[0..4].iter().all(|b| b.is_ascii_alphabetic())
            && buf[4..7].iter().all(|b| b.is_ascii_digit());
        if !valid {
            return None;
        }
        Some(ProcedureCode { bytes: buf })
    }
}

impl fmt::Display for ProcedureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for ProcedureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProcedureCode({})", self.as_str())
    }
}

/// Homogeneous-group-of-stay pricing code. `0` means "no GHS assigned".
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GhsCode(pub u16);

impl GhsCode {
    pub fn is_valid(self) -> bool {
        self.0 != 0
    }

    pub fn parse(s: &str) -> Option<GhsCode> {
        let n: u16 = s.parse().ok()?;
        Some(GhsCode(n))
    }
}

impl fmt::Display for GhsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for GhsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GhsCode({})", self.0)
    }
}

/// Care-unit authorization code. `0` means "no unit recorded".
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitCode(pub u16);

impl UnitCode {
    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for UnitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for UnitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnitCode({})", self.0)
    }
}

impl Serialize for Sex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

impl<'de> Deserialize<'de> for Sex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = u8::deserialize(deserializer)?;
        Sex::from_u8(raw).ok_or_else(|| D::Error::custom(format!("invalid sex code {raw}")))
    }
}

macro_rules! impl_code_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                <$ty>::parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid code '{raw}'")))
            }
        }
    };
}

impl_code_serde!(GhmRootCode);
impl_code_serde!(GhmCode);
impl_code_serde!(DiagnosisCode);
impl_code_serde!(ProcedureCode);

impl Serialize for GhsCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.0)
    }
}

impl<'de> Deserialize<'de> for GhsCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(GhsCode(u16::deserialize(deserializer)?))
    }
}

impl Serialize for UnitCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.0)
    }
}

impl<'de> Deserialize<'de> for UnitCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(UnitCode(u16::deserialize(deserializer)?))
    }
}
