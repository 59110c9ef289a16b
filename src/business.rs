//! The business record a site is generated from.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::slugify;

const SLUG_MAX_LEN: usize = 60;

/// Input record describing the business. Required text fields default to
/// empty so that a missing field is reported by [`BusinessRecord::validate`]
/// rather than by the JSON decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    /// Founding year.
    #[serde(default)]
    pub year: i32,
    /// Comma-separated list of services.
    #[serde(default)]
    pub services: String,
    #[serde(default)]
    pub positioning: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub city: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_hours")]
    pub hours: String,
    #[serde(default = "default_primary_color")]
    pub primary_color: String,
    #[serde(default = "default_secondary_color")]
    pub secondary_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_url: Option<String>,
}

fn default_country() -> String {
    "Luxembourg".to_string()
}

fn default_hours() -> String {
    "Lundi-Vendredi 8h-18h".to_string()
}

fn default_primary_color() -> String {
    "#1a5490".to_string()
}

fn default_secondary_color() -> String {
    "#ff8c42".to_string()
}

/// Every problem found in a record, reported together.
#[derive(Debug, Error, PartialEq)]
#[error("Invalid business data: {}", problems.join("; "))]
pub struct InvalidBusinessRecord {
    pub problems: Vec<String>,
}

impl BusinessRecord {
    pub fn validate(&self) -> Result<(), InvalidBusinessRecord> {
        let mut problems = Vec::new();

        if self.name.trim().chars().count() < 2 {
            problems.push("name must be at least 2 characters".to_string());
        }
        let required = [
            ("location", &self.location),
            ("phone", &self.phone),
            ("services", &self.services),
            ("positioning", &self.positioning),
            ("street", &self.street),
            ("postal_code", &self.postal_code),
            ("city", &self.city),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                problems.push(format!("{} is required", field));
            }
        }
        if !looks_like_email(&self.email) {
            problems.push(format!("email '{}' is not a valid address", self.email));
        }
        if !(1900..=2100).contains(&self.year) {
            problems.push(format!("year {} must be between 1900 and 2100", self.year));
        }
        if !self.name.trim().is_empty() && self.site_slug().is_empty() {
            problems.push(
                "name and city must contain at least one Latin letter or digit".to_string(),
            );
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(InvalidBusinessRecord { problems })
        }
    }

    /// Directory and project name for the generated site.
    pub fn site_slug(&self) -> String {
        slugify(&format!("{} {}", self.name, self.city), SLUG_MAX_LEN)
    }

    pub fn years_in_business(&self, current_year: i32) -> u32 {
        u32::try_from(current_year - self.year).unwrap_or(0)
    }

    pub fn service_list(&self) -> Vec<&str> {
        self.services
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn primary_service(&self) -> &str {
        self.service_list().first().copied().unwrap_or("services")
    }

    /// Bare host of the custom domain, if one was given.
    pub fn custom_domain(&self) -> Option<String> {
        let url = self.domain_url.as_deref()?.trim();
        let host = url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');
        (!host.is_empty()).then(|| host.to_string())
    }

    /// Public URL the site is expected to live at before deployment reports one.
    pub fn expected_site_url(&self, site_slug: &str) -> String {
        match self.domain_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => fallback_site_url(site_slug),
        }
    }
}

/// Vercel's default production URL for a project.
pub fn fallback_site_url(site_slug: &str) -> String {
    format!("https://{}.vercel.app", site_slug)
}

fn looks_like_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}
