use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub college: String,
    pub branch: String,
    pub graduation_year: i32,
    pub skills: Vec<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudentProfile {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub college: String,
    #[serde(default)]
    pub branch: String,
    pub graduation_year: i32,
    #[serde(default)]
    pub skills: Vec<String>,
    pub bio: Option<String>,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfileUpdate {
    pub name: Option<String>,
    pub college: Option<String>,
    pub branch: Option<String>,
    pub graduation_year: Option<i32>,
    pub skills: Option<Vec<String>>,
    pub bio: Option<String>,
}

impl StudentProfileUpdate {
    pub fn apply(self, profile: &mut StudentProfile) {
        if let Some(name) = self.name {
            profile.name = name;
        }
        if let Some(college) = self.college {
            profile.college = college;
        }
        if let Some(branch) = self.branch {
            profile.branch = branch;
        }
        if let Some(year) = self.graduation_year {
            profile.graduation_year = year;
        }
        if let Some(skills) = self.skills {
            profile.skills = skills;
        }
        if self.bio.is_some() {
            profile.bio = self.bio;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AlumniProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub company: String,
    pub designation: String,
    pub graduation_year: i32,
    #[serde(rename = "packageLPA")]
    pub package_lpa: f64,
    pub skills: Vec<String>,
    pub linkedin_url: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlumniProfile {
    pub name: String,
    pub email: String,
    pub company: String,
    #[serde(default)]
    pub designation: String,
    pub graduation_year: i32,
    #[serde(rename = "packageLPA", default)]
    pub package_lpa: f64,
    #[serde(default)]
    pub skills: Vec<String>,
    pub linkedin_url: Option<String>,
}

/// Partial update. `isVerified` is deliberately absent: only the admin
/// verify action may change it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlumniProfileUpdate {
    pub name: Option<String>,
    pub company: Option<String>,
    pub designation: Option<String>,
    pub graduation_year: Option<i32>,
    #[serde(rename = "packageLPA")]
    pub package_lpa: Option<f64>,
    pub skills: Option<Vec<String>>,
    pub linkedin_url: Option<String>,
}

impl AlumniProfileUpdate {
    pub fn apply(self, profile: &mut AlumniProfile) {
        if let Some(name) = self.name {
            profile.name = name;
        }
        if let Some(company) = self.company {
            profile.company = company;
        }
        if let Some(designation) = self.designation {
            profile.designation = designation;
        }
        if let Some(year) = self.graduation_year {
            profile.graduation_year = year;
        }
        if let Some(package) = self.package_lpa {
            profile.package_lpa = package;
        }
        if let Some(skills) = self.skills {
            profile.skills = skills;
        }
        if self.linkedin_url.is_some() {
            profile.linkedin_url = self.linkedin_url;
        }
    }
}

/// Aggregate profile counts for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileCounts {
    pub students: i64,
    pub alumni: i64,
    pub verified_alumni: i64,
}
