use serde::Deserialize;

use crate::errors::AppError;
use crate::models::profile::AlumniProfile;

/// Raw query string for `GET /api/alumni/search`. Every field arrives as a
/// string because clients send empty values (`?company=&graduationYear=`).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlumniSearchParams {
    pub company: Option<String>,
    pub graduation_year: Option<String>,
    pub min_package: Option<String>,
}

/// Parsed alumni filter. Results are always restricted to verified profiles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlumniSearch {
    /// Case-insensitive substring of the company name.
    pub company: Option<String>,
    pub graduation_year: Option<i32>,
    /// Inclusive lower bound on `packageLPA`.
    pub min_package: Option<f64>,
}

impl AlumniSearch {
    pub fn from_params(params: AlumniSearchParams) -> Result<Self, AppError> {
        let company = non_blank(params.company);

        let graduation_year = non_blank(params.graduation_year)
            .map(|raw| {
                raw.parse::<i32>().map_err(|_| {
                    AppError::Validation(format!("graduationYear '{raw}' is not a year"))
                })
            })
            .transpose()?;

        let min_package = non_blank(params.min_package)
            .map(|raw| match raw.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(v),
                _ => Err(AppError::Validation(format!(
                    "minPackage '{raw}' is not a number"
                ))),
            })
            .transpose()?;

        Ok(AlumniSearch {
            company,
            graduation_year,
            min_package,
        })
    }

    pub fn matches(&self, profile: &AlumniProfile) -> bool {
        if !profile.is_verified {
            return false;
        }
        if let Some(company) = &self.company {
            if !profile
                .company
                .to_lowercase()
                .contains(&company.to_lowercase())
            {
                return false;
            }
        }
        if let Some(year) = self.graduation_year {
            if profile.graduation_year != year {
                return false;
            }
        }
        if let Some(min) = self.min_package {
            if profile.package_lpa < min {
                return false;
            }
        }
        true
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Escapes `%`, `_` and `\` so user input is matched literally by ILIKE.
pub fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn alumni(company: &str, year: i32, package: f64, verified: bool) -> AlumniProfile {
        AlumniProfile {
            id: Uuid::new_v4(),
            name: "Test".to_string(),
            email: format!("{}@corp.com", Uuid::new_v4()),
            company: company.to_string(),
            designation: "Engineer".to_string(),
            graduation_year: year,
            package_lpa: package,
            skills: vec![],
            linkedin_url: None,
            is_verified: verified,
            created_at: Utc::now(),
        }
    }

    fn params(company: &str, year: &str, package: &str) -> AlumniSearchParams {
        AlumniSearchParams {
            company: Some(company.to_string()),
            graduation_year: Some(year.to_string()),
            min_package: Some(package.to_string()),
        }
    }

    #[test]
    fn test_empty_params_mean_no_filter() {
        let search = AlumniSearch::from_params(params("", " ", "")).unwrap();
        assert_eq!(search, AlumniSearch::default());
        assert!(search.matches(&alumni("Anything", 2001, 0.0, true)));
    }

    #[test]
    fn test_unverified_never_matches() {
        let search = AlumniSearch::default();
        assert!(!search.matches(&alumni("Amazon", 2019, 40.0, false)));
    }

    #[test]
    fn test_company_and_year_filter() {
        let search = AlumniSearch::from_params(params("Amazon", "2019", "")).unwrap();
        assert!(search.matches(&alumni("Amazon", 2019, 20.0, true)));
        assert!(search.matches(&alumni("amazon web services", 2019, 20.0, true)));
        assert!(!search.matches(&alumni("Amazon", 2020, 20.0, true)));
        assert!(!search.matches(&alumni("Google", 2019, 20.0, true)));
    }

    #[test]
    fn test_min_package_is_inclusive() {
        let search = AlumniSearch::from_params(params("", "", "10")).unwrap();
        assert!(search.matches(&alumni("X", 2019, 10.0, true)));
        assert!(search.matches(&alumni("X", 2019, 12.5, true)));
        assert!(!search.matches(&alumni("X", 2019, 9.99, true)));
    }

    #[test]
    fn test_non_numeric_year_rejected() {
        let err = AlumniSearch::from_params(params("", "twenty", "")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_nan_package_rejected() {
        assert!(AlumniSearch::from_params(params("", "", "NaN")).is_err());
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("Amazon"), "Amazon");
    }
}
