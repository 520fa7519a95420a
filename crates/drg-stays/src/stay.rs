//! In-memory stay fragments and the set that owns a whole ingested batch.

use drg_schemas::{Date, DiagnosisCode, ProcedureCode, Sex, UnitCode};

/// One procedure performed during a stay fragment.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Procedure {
    pub code: ProcedureCode,
    pub phase: u8,
    pub date: Date,
    /// Number of times the procedure was performed, clamped to 9999 on merge.
    pub count: u16,
    pub activities: u32,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EntryInfo {
    pub mode: u8,
    pub origin: u8,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ExitInfo {
    pub mode: u8,
    pub destination: u8,
}

/// A single stay fragment as ingested, before clustering/aggregation.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Stay {
    pub stay_id: u32,
    pub bill_id: u32,
    pub birthdate: Date,
    pub sex: Sex,
    pub entry_date: Date,
    pub exit_date: Date,
    pub entry: EntryInfo,
    pub exit: ExitInfo,
    pub unit: Option<UnitCode>,
    pub session_count: u16,
    pub igs2: Option<u16>,
    pub gestational_age: Option<u16>,
    pub newborn_weight: Option<u16>,
    pub last_menstrual_period: Option<Date>,
    pub main_diagnosis: DiagnosisCode,
    pub linked_diagnosis: Option<DiagnosisCode>,
    /// Sorted, deduplicated at ingest time.
    pub associated_diagnoses: Vec<DiagnosisCode>,
    pub procedures: Vec<Procedure>,
    /// Classification error codes accumulated while this fragment was
    /// built (e.g. a malformed field detected during ingest).
    pub errors: Vec<i16>,
}

impl Stay {
    /// Age in whole years at `entry_date`, per the "subtract one if the
    /// entry month/day is earlier than the birth month/day" rule.
    pub fn age_years(&self) -> i32 {
        let mut years = self.entry_date.year as i32 - self.birthdate.year as i32;
        let entry_md = (self.entry_date.month, self.entry_date.day);
        let birth_md = (self.birthdate.month, self.birthdate.day);
        if entry_md < birth_md {
            years -= 1;
        }
        years.max(0)
    }

    pub fn duration_days(&self) -> i64 {
        (self.exit_date - self.entry_date).max(0)
    }
}

/// An ingested, sorted batch of stays. Stays are ordered by `stay_id`,
/// preserving ingest order among fragments that share an id.
#[derive(Default)]
pub struct StaySet {
    stays: Vec<Stay>,
}

impl StaySet {
    pub fn stays(&self) -> &[Stay] {
        &self.stays
    }

    pub fn len(&self) -> usize {
        self.stays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stays.is_empty()
    }
}

/// Accumulates stays in ingest order, then sorts once on [`StaySetBuilder::build`].
#[derive(Default)]
pub struct StaySetBuilder {
    stays: Vec<Stay>,
}

impl StaySetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mut stay: Stay) {
        stay.associated_diagnoses.sort();
        stay.associated_diagnoses.dedup();
        self.stays.push(stay);
    }

    /// Sort by `stay_id` with a stable sort, so fragments sharing an id keep
    /// their push order.
    pub fn build(mut self) -> StaySet {
        self.stays.sort_by_key(|s| s.stay_id);
        StaySet { stays: self.stays }
    }
}
