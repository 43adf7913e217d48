/*
 * Responsibility
 * - Schools request/response DTOs and list query parsing
 * - one rule set for a school record, applied on create and after a patch
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::repos::paging::{MAX_PAGE, MAX_PAGE_SIZE, Metadata, Page, Sort};
use crate::repos::school_repo::{NewSchool, SchoolFilters, SchoolRow};
use crate::validator::{FieldErrors, Validator, is_email, is_phone, is_website, unique};

const SHORT_TEXT_MAX_BYTES: usize = 200;
const ADDRESS_MAX_BYTES: usize = 500;
const MODE_MAX_ENTRIES: usize = 5;

/// Borrowed view over the fields every stored school must satisfy.
struct SchoolFields<'a> {
    name: &'a str,
    level: &'a str,
    contact: &'a str,
    phone: &'a str,
    email: &'a str,
    website: &'a str,
    address: &'a str,
    mode: &'a [String],
}

impl<'a> From<&'a NewSchool> for SchoolFields<'a> {
    fn from(s: &'a NewSchool) -> Self {
        Self {
            name: &s.name,
            level: &s.level,
            contact: &s.contact,
            phone: &s.phone,
            email: &s.email,
            website: &s.website,
            address: &s.address,
            mode: &s.mode,
        }
    }
}

impl<'a> From<&'a SchoolRow> for SchoolFields<'a> {
    fn from(s: &'a SchoolRow) -> Self {
        Self {
            name: &s.name,
            level: &s.level,
            contact: &s.contact,
            phone: &s.phone,
            email: &s.email,
            website: &s.website,
            address: &s.address,
            mode: &s.mode,
        }
    }
}

fn check_short_text(v: &mut Validator, field: &'static str, value: &str) {
    v.check(!value.is_empty(), field, "must be provided");
    v.check(
        value.len() <= SHORT_TEXT_MAX_BYTES,
        field,
        "must not be more than 200 bytes long",
    );
}

fn validate_school(s: SchoolFields<'_>) -> Result<(), FieldErrors> {
    let mut v = Validator::new();

    check_short_text(&mut v, "name", s.name);
    check_short_text(&mut v, "level", s.level);
    check_short_text(&mut v, "contact", s.contact);

    v.check(!s.phone.is_empty(), "phone", "must be provided");
    v.check(is_phone(s.phone), "phone", "must be a valid phone number");

    v.check(!s.email.is_empty(), "email", "must be provided");
    v.check(is_email(s.email), "email", "must be a valid email address");

    v.check(!s.website.is_empty(), "website", "must be provided");
    v.check(is_website(s.website), "website", "must be a valid http or https URL");

    v.check(!s.address.is_empty(), "address", "must be provided");
    v.check(
        s.address.len() <= ADDRESS_MAX_BYTES,
        "address",
        "must not be more than 500 bytes long",
    );

    v.check(!s.mode.is_empty(), "mode", "must be provided");
    v.check(
        s.mode.len() <= MODE_MAX_ENTRIES,
        "mode",
        "must contain at most 5 entries",
    );
    v.check(unique(s.mode), "mode", "must not contain duplicate values");

    v.into_result()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateSchoolRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub mode: Vec<String>,
}

impl CreateSchoolRequest {
    pub fn into_new_school(self) -> Result<NewSchool, FieldErrors> {
        let school = NewSchool {
            name: self.name,
            level: self.level,
            contact: self.contact,
            phone: self.phone,
            email: self.email,
            website: self.website,
            address: self.address,
            mode: self.mode,
        };
        validate_school(SchoolFields::from(&school))?;
        Ok(school)
    }
}

/// Partial update: absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateSchoolRequest {
    pub name: Option<String>,
    pub level: Option<String>,
    pub contact: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub mode: Option<Vec<String>>,
}

impl UpdateSchoolRequest {
    /// Merge into `row`, then validate the merged record as a whole.
    pub fn apply(self, row: &mut SchoolRow) -> Result<(), FieldErrors> {
        fn merge<T>(slot: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *slot = v;
            }
        }

        merge(&mut row.name, self.name);
        merge(&mut row.level, self.level);
        merge(&mut row.contact, self.contact);
        merge(&mut row.phone, self.phone);
        merge(&mut row.email, self.email);
        merge(&mut row.website, self.website);
        merge(&mut row.address, self.address);
        merge(&mut row.mode, self.mode);

        validate_school(SchoolFields::from(&*row))
    }
}

/// Raw query string of `GET /v1/schools`; every value arrives as text so a
/// bad number becomes a field error instead of a rejection.
#[derive(Debug, Default, Deserialize)]
pub struct ListSchoolsQuery {
    pub name: Option<String>,
    pub level: Option<String>,
    pub mode: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub sort: Option<String>,
}

fn parse_bounded(
    v: &mut Validator,
    field: &'static str,
    raw: Option<&str>,
    default: i64,
    max: i64,
) -> i64 {
    let Some(raw) = raw else {
        return default;
    };
    match raw.parse::<i64>() {
        Ok(n) if n < 1 => {
            v.add_error(field, "must be greater than zero");
            default
        }
        Ok(n) if n > max => {
            v.add_error(field, format!("must be a maximum of {max}"));
            default
        }
        Ok(n) => n,
        Err(_) => {
            v.add_error(field, "must be an integer value");
            default
        }
    }
}

impl ListSchoolsQuery {
    pub fn into_filters(self) -> Result<SchoolFilters, FieldErrors> {
        let mut v = Validator::new();
        let defaults = Page::default();

        let page = Page {
            page: parse_bounded(&mut v, "page", self.page.as_deref(), defaults.page, MAX_PAGE),
            page_size: parse_bounded(
                &mut v,
                "page_size",
                self.page_size.as_deref(),
                defaults.page_size,
                MAX_PAGE_SIZE,
            ),
        };

        let sort = match self.sort.as_deref() {
            None | Some("") => Sort::default(),
            Some(raw) => Sort::parse(raw).unwrap_or_else(|| {
                v.add_error("sort", "invalid sort value");
                Sort::default()
            }),
        };

        let mode = self
            .mode
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        v.into_result()?;

        Ok(SchoolFilters {
            name: self.name.unwrap_or_default(),
            level: self.level.unwrap_or_default(),
            mode,
            page,
            sort,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct SchoolResponse {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub level: String,
    pub contact: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    pub address: String,
    pub mode: Vec<String>,
    pub version: i32,
}

impl From<SchoolRow> for SchoolResponse {
    fn from(row: SchoolRow) -> Self {
        Self {
            id: row.id,
            created_at: row.created_at,
            name: row.name,
            level: row.level,
            contact: row.contact,
            phone: row.phone,
            email: row.email,
            website: row.website,
            address: row.address,
            mode: row.mode,
            version: row.version,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SchoolEnvelope {
    pub school: SchoolResponse,
}

#[derive(Debug, Serialize)]
pub struct SchoolListEnvelope {
    pub schools: Vec<SchoolResponse>,
    pub metadata: Metadata,
}

#[derive(Debug, Serialize)]
pub struct MessageEnvelope {
    pub message: &'static str,
}
