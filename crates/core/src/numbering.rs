//! Display-only candidate identifiers.
//!
//! The backend issues the real patient and bill numbers. These candidates are shown on the
//! forms before saving and sent where the backend accepts a client suggestion.

use crate::models::PatientKind;
use chrono::NaiveDate;
use rand::Rng;

/// `OP-yyyyMM-NNN` for outpatients, `IP-yyyyMM-NNNNNN` for inpatients.
pub fn patient_number<R: Rng + ?Sized>(kind: PatientKind, date: NaiveDate, rng: &mut R) -> String {
    let month = date.format("%Y%m");
    match kind {
        PatientKind::Op => format!("OP-{month}-{:03}", rng.gen_range(0..1_000)),
        PatientKind::Ip => format!("IP-{month}-{:06}", rng.gen_range(0..1_000_000)),
    }
}

/// `OPyyyyMMdd-NNNN` or `IPyyyyMMdd-NNNN`.
pub fn bill_number<R: Rng + ?Sized>(kind: PatientKind, date: NaiveDate, rng: &mut R) -> String {
    format!(
        "{}{}-{:04}",
        kind.label(),
        date.format("%Y%m%d"),
        rng.gen_range(0..10_000)
    )
}

/// `DRNNNN`, used when a new doctor is saved without a code.
pub fn doctor_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("DR{:04}", rng.gen_range(0..10_000))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 7).unwrap()
    }

    #[test]
    fn patient_numbers_carry_kind_prefix_and_width() {
        let mut rng = StdRng::seed_from_u64(7);
        let op = patient_number(PatientKind::Op, date(), &mut rng);
        let ip = patient_number(PatientKind::Ip, date(), &mut rng);
        assert!(op.starts_with("OP-202502-"));
        assert_eq!(op.len(), "OP-202502-".len() + 3);
        assert!(ip.starts_with("IP-202502-"));
        assert_eq!(ip.len(), "IP-202502-".len() + 6);
    }

    #[test]
    fn bill_number_includes_day() {
        let mut rng = StdRng::seed_from_u64(1);
        let n = bill_number(PatientKind::Op, date(), &mut rng);
        assert!(n.starts_with("OP20250207-"));
        assert_eq!(n.len(), 16);
    }

    #[test]
    fn doctor_code_is_four_digits() {
        let mut rng = StdRng::seed_from_u64(3);
        let code = doctor_code(&mut rng);
        assert!(code.starts_with("DR"));
        assert!(code[2..].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(code.len(), 6);
    }
}
