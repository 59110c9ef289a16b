//! Prompt builders, one per workflow phase.
//!
//! Every builder is a pure function of a [`PromptContext`] (plus phase-specific
//! inputs such as a validation report) so prompts can be checked in tests
//! without running the agent.

pub mod components;
pub mod content;
pub mod deploy;
pub mod pages;
pub mod publish;
pub mod sections;
pub mod setup;
pub mod validation;

use std::path::Path;

use crate::business::BusinessRecord;

/// Everything a prompt may mention about the site being built.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub business: &'a BusinessRecord,
    pub site_slug: &'a str,
    pub site_dir: &'a Path,
    pub current_year: i32,
}

impl<'a> PromptContext<'a> {
    pub fn new(
        business: &'a BusinessRecord,
        site_slug: &'a str,
        site_dir: &'a Path,
        current_year: i32,
    ) -> Self {
        Self {
            business,
            site_slug,
            site_dir,
            current_year,
        }
    }

    pub fn years_in_business(&self) -> u32 {
        self.business.years_in_business(self.current_year)
    }

    /// Business facts shared by every generation prompt.
    pub fn business_brief(&self) -> String {
        let b = self.business;
        let services = b
            .service_list()
            .iter()
            .map(|s| format!("  - {}", s))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "BUSINESS CONTEXT:
- Name: {name}
- Sector: {sector}
- Positioning: {positioning}
- Founded: {year} ({years} years in business)
- Address: {street}, {postal_code} {city}, {country}
- Service area: {location}
- Phone: {phone}
- Email: {email}
- Opening hours: {hours}
- Primary color: {primary}
- Accent color: {secondary}
- Services:
{services}

PROJECT DIRECTORY: {dir}",
            name = b.name,
            sector = b.primary_service(),
            positioning = b.positioning,
            year = b.year,
            years = self.years_in_business(),
            street = b.street,
            postal_code = b.postal_code,
            city = b.city,
            country = b.country,
            location = b.location,
            phone = b.phone,
            email = b.email,
            hours = b.hours,
            primary = b.primary_color,
            secondary = b.secondary_color,
            services = services,
            dir = self.site_dir.display(),
        )
    }
}
