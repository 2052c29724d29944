//! Department and particular master data.

use crate::models::{Department, DepartmentCreate, Particular, ParticularCreate, SettingsStats};
use crate::notice::{confirmed, Confirm, Notice};
use crate::{HmsError, HmsResult};
use hms_types::NonEmptyText;

#[derive(Debug, Clone, Default)]
pub struct SettingsScreen {
    departments: Vec<Department>,
    particulars: Vec<Particular>,
    stats: SettingsStats,
}

impl SettingsScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn departments(&self) -> &[Department] {
        &self.departments
    }

    pub fn particulars(&self) -> &[Particular] {
        &self.particulars
    }

    pub fn stats(&self) -> SettingsStats {
        self.stats
    }

    /// Installs the three lookups, fetched together after every mutation.
    pub fn apply_loaded(
        &mut self,
        departments: Vec<Department>,
        particulars: Vec<Particular>,
        stats: SettingsStats,
    ) {
        self.departments = departments;
        self.particulars = particulars;
        self.stats = stats;
    }

    /// # Errors
    ///
    /// `HmsError::InvalidText` when the name is blank.
    pub fn prepare_add_department(&self, name: &str) -> HmsResult<DepartmentCreate> {
        Ok(DepartmentCreate {
            name: NonEmptyText::new(name)?,
        })
    }

    /// Builds a new particular. The department and rate are optional.
    ///
    /// # Errors
    ///
    /// `HmsError::InvalidText` when the name is blank, `HmsError::NegativeAmount` for a
    /// negative rate, `HmsError::InvalidInput` for an unknown department.
    pub fn prepare_add_particular(
        &self,
        name: &str,
        department_id: Option<i64>,
        rate: Option<f64>,
    ) -> HmsResult<ParticularCreate> {
        let name = NonEmptyText::new(name)?;
        if rate.is_some_and(|r| r < 0.0 || !r.is_finite()) {
            return Err(HmsError::NegativeAmount { field: "rate" });
        }
        let department_id = department_id.filter(|id| *id > 0);
        if let Some(id) = department_id {
            if !self.departments.iter().any(|d| d.id == id) {
                return Err(HmsError::InvalidInput(format!("no department with id {id}")));
            }
        }
        Ok(ParticularCreate {
            name,
            department_id,
            rate,
        })
    }

    pub fn department_added(&self) -> Notice {
        Notice::success("Department added")
    }

    pub fn particular_added(&self) -> Notice {
        Notice::success("Particular added")
    }

    /// # Errors
    ///
    /// `HmsError::InvalidInput` for an unknown id, `HmsError::Declined` when declined.
    pub fn request_delete_department(&self, id: i64, confirm: &mut impl Confirm) -> HmsResult<i64> {
        if !self.departments.iter().any(|d| d.id == id) {
            return Err(HmsError::InvalidInput(format!("no department with id {id}")));
        }
        confirmed(confirm, "Delete this department?")?;
        Ok(id)
    }

    /// # Errors
    ///
    /// `HmsError::InvalidInput` for an unknown id, `HmsError::Declined` when declined.
    pub fn request_delete_particular(&self, id: i64, confirm: &mut impl Confirm) -> HmsResult<i64> {
        if !self.particulars.iter().any(|p| p.id == id) {
            return Err(HmsError::InvalidInput(format!("no particular with id {id}")));
        }
        confirmed(confirm, "Delete this particular?")?;
        Ok(id)
    }

    pub fn department_deleted(&self) -> Notice {
        Notice::success("Department deleted")
    }

    pub fn particular_deleted(&self) -> Notice {
        Notice::success("Particular deleted")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hms_types::TextError;

    fn screen() -> SettingsScreen {
        let mut s = SettingsScreen::new();
        s.apply_loaded(
            vec![Department {
                id: 1,
                name: "Laboratory".into(),
                created_at: None,
            }],
            vec![Particular {
                id: 5,
                name: "CBC".into(),
                department_id: Some(1),
                ..Particular::default()
            }],
            SettingsStats {
                total_departments: 1,
                total_particulars: 1,
            },
        );
        s
    }

    #[test]
    fn blank_names_are_rejected() {
        let s = screen();
        assert!(matches!(
            s.prepare_add_department("   "),
            Err(HmsError::InvalidText(TextError::Empty))
        ));
        assert!(matches!(
            s.prepare_add_particular("", Some(1), None),
            Err(HmsError::InvalidText(TextError::Empty))
        ));
        assert_eq!(s.prepare_add_department(" Radiology ").unwrap().name.as_str(), "Radiology");
        assert_eq!(
            HmsError::from(TextError::Empty).to_string(),
            "name cannot be blank"
        );
    }

    #[test]
    fn particular_department_is_optional() {
        let s = screen();
        let body = s.prepare_add_particular("ECG", Some(0), Some(150.0)).unwrap();
        assert_eq!(body.department_id, None);
        assert_eq!(body.rate, Some(150.0));
        assert!(s.prepare_add_particular("ECG", Some(7), None).is_err());
        assert!(s.prepare_add_particular("ECG", None, Some(-1.0)).is_err());
    }

    #[test]
    fn deletes_are_confirmed() {
        let s = screen();
        assert!(matches!(
            s.request_delete_department(1, &mut |_: &str| false),
            Err(HmsError::Declined)
        ));
        assert_eq!(s.request_delete_particular(5, &mut |_: &str| true).unwrap(), 5);
        assert!(s.request_delete_particular(6, &mut |_: &str| true).is_err());
        assert_eq!(s.stats().total_particulars, 1);
    }
}
