// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request validation and sanitization.
//!
//! Every validator collects all field problems before failing, so a client
//! sees the complete list in one `400 Validation error` response. Free-text
//! fields are stripped of HTML markup and trimmed before they reach the store.

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{
    ChangePasswordRequest, CompanyRequest, LoginRequest, RegisterRequest, UpdateProfileRequest,
    VerifyMobileRequest,
};
use crate::storage::{CompanyChanges, Gender, NewCompany, NewUser, ProfileChanges, SocialLinks};

/// Characters that satisfy the "special character" password rule.
pub const PASSWORD_SPECIALS: &str = "@$!%*?&";

pub const MIN_PASSWORD_LEN: usize = 8;

/// Social networks whose links must be valid URLs.
const SOCIAL_NETWORKS: &[(&str, &str)] = &[
    ("facebook", "Facebook"),
    ("twitter", "Twitter"),
    ("linkedin", "LinkedIn"),
    ("instagram", "Instagram"),
];

/// A single field problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Accumulated field problems.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: &str) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &str, message: &str) {
        self.0.push(FieldError::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|e| e.field.as_str())
    }

    pub fn into_inner(self) -> Vec<FieldError> {
        self.0
    }

    /// `Ok(value)` when nothing was recorded, otherwise `Err(self)`.
    pub fn finish<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<&str> = self.fields().collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

// =============================================================================
// Primitive checks
// =============================================================================

/// Strip all HTML tags and trim. The contents of `<script>` and `<style>`
/// elements are dropped along with the tags. A `<` that does not open a tag
/// (`a < b`, or one never closed by `>`) is kept as text.
pub fn sanitize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let after = &rest[start..];
        let end = match after.find('>') {
            Some(end) if opens_tag(&after[1..]) => end,
            _ => {
                out.push('<');
                rest = &after[1..];
                continue;
            }
        };

        let tag = after[1..end].trim().to_ascii_lowercase();
        rest = &after[end + 1..];

        for raw in ["script", "style"] {
            if tag == raw || tag.starts_with(&format!("{raw} ")) {
                let close = format!("</{raw}");
                let lower = rest.to_ascii_lowercase();
                rest = match lower.find(&close) {
                    Some(pos) => match rest[pos..].find('>') {
                        Some(gt) => &rest[pos + gt + 1..],
                        None => "",
                    },
                    None => "",
                };
            }
        }
    }
    out.push_str(rest);
    out.trim().to_string()
}

/// Tag names start with a letter; `/` closes and `!` opens comments or doctypes.
fn opens_tag(after_lt: &str) -> bool {
    after_lt
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!')
}

/// `local@domain.tld` with no whitespace and exactly one `@`.
pub fn is_valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    if local.is_empty() || email.chars().any(char::is_whitespace) {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// E.164: optional `+`, a non-zero leading digit, 2 to 15 digits in total.
pub fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    let len = digits.len();
    (2..=15).contains(&len)
        && digits.chars().all(|c| c.is_ascii_digit())
        && !digits.starts_with('0')
}

/// Absolute http(s) or ftp URL whose host has a dot-separated suffix. A bare
/// host such as `example.com` is accepted as `http://example.com`.
pub fn is_valid_url(raw: &str) -> bool {
    if raw.is_empty() || raw.chars().any(char::is_whitespace) {
        return false;
    }
    let parsed = match url::Url::parse(raw) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            match url::Url::parse(&format!("http://{raw}")) {
                Ok(url) => url,
                Err(_) => return false,
            }
        }
        Err(_) => return false,
    };

    if !matches!(parsed.scheme(), "http" | "https" | "ftp") {
        return false;
    }
    match parsed.host() {
        Some(url::Host::Domain(domain)) => domain
            .rsplit_once('.')
            .is_some_and(|(name, tld)| !name.is_empty() && tld.len() >= 2),
        Some(_) => true,
        None => false,
    }
}

/// Strict `YYYY-MM-DD` calendar date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    if raw.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Password strength rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordStrength {
    Weak,
    Medium,
    Strong,
}

/// Result of [`check_password_strength`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordReport {
    pub strength: PasswordStrength,
    pub errors: Vec<&'static str>,
}

impl PasswordReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Rate a password: at least 8 characters with lower, upper, digit and one of
/// `@$!%*?&`. Valid passwords of 12 or more characters rate strong.
pub fn check_password_strength(password: &str) -> PasswordReport {
    let mut errors = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push("Password must be at least 8 characters long");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one number");
    }
    if !password.chars().any(|c| PASSWORD_SPECIALS.contains(c)) {
        errors.push("Password must contain at least one special character");
    }

    let strength = if !errors.is_empty() {
        PasswordStrength::Weak
    } else if password.chars().count() >= 12 {
        PasswordStrength::Strong
    } else {
        PasswordStrength::Medium
    };
    PasswordReport { strength, errors }
}

fn check_new_password(errors: &mut ValidationErrors, field: &str, password: &str) {
    let report = check_password_strength(password);
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(field, "Password must be at least 8 characters long");
    } else if !report.is_valid() {
        errors.push(
            field,
            "Password must contain at least one uppercase letter, one lowercase letter, one number, and one special character",
        );
    }
}

fn check_length(errors: &mut ValidationErrors, field: &str, value: &str, max: usize, label: &str) {
    if value.chars().count() > max {
        errors.push(field, &format!("{label} must not exceed {max} characters"));
    }
}

/// Sanitize an optional text field; blank values become `None`.
fn clean(value: Option<&String>) -> Option<String> {
    value.map(|v| sanitize(v)).filter(|v| !v.is_empty())
}

// =============================================================================
// Request validators
// =============================================================================

/// Validate a registration payload into a store insert.
pub fn validate_register(req: &RegisterRequest) -> Result<NewUser, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let email = sanitize(&req.email).to_lowercase();
    if !is_valid_email(&email) {
        errors.push("email", "Please provide a valid email address");
    }

    check_new_password(&mut errors, "password", &req.password);

    let full_name = sanitize(&req.full_name);
    if full_name.is_empty() {
        errors.push("full_name", "Full name is required");
    } else if !(2..=255).contains(&full_name.chars().count()) {
        errors.push("full_name", "Full name must be between 2 and 255 characters");
    }

    let gender = Gender::from_code(req.gender.trim());
    if gender.is_none() {
        errors.push("gender", "Gender must be m (male), f (female), or o (other)");
    }

    let mobile_no = sanitize(&req.mobile_no);
    if !is_valid_phone(&mobile_no) {
        errors.push(
            "mobile_no",
            "Please provide a valid mobile number with country code (E.164 format)",
        );
    }

    match gender {
        Some(gender) if errors.is_empty() => Ok(NewUser {
            email,
            password: req.password.clone(),
            full_name,
            gender,
            mobile_no,
            signup_type: crate::storage::users::SIGNUP_TYPE_EMAIL.to_string(),
        }),
        _ => Err(errors),
    }
}

/// Validate a login payload. Returns the normalized email.
pub fn validate_login(req: &LoginRequest) -> Result<String, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let email = sanitize(&req.email).to_lowercase();
    if !is_valid_email(&email) {
        errors.push("email", "Please provide a valid email address");
    }
    if req.password.is_empty() {
        errors.push("password", "Password is required");
    }

    errors.finish(email)
}

/// Validate a mobile verification payload. Returns the sanitized number.
pub fn validate_mobile_verification(req: &VerifyMobileRequest) -> Result<String, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let mobile_no = sanitize(&req.mobile_no);
    if !is_valid_phone(&mobile_no) {
        errors.push("mobile_no", "Please provide a valid mobile number");
    }

    let otp = req.otp_code.trim();
    if !(4..=6).contains(&otp.len()) {
        errors.push("otp_code", "OTP must be 4-6 digits");
    } else if !otp.chars().all(|c| c.is_ascii_digit()) {
        errors.push("otp_code", "OTP must contain only numbers");
    }

    errors.finish(mobile_no)
}

/// Validate profile changes. Unknown or blank fields are ignored; at least one
/// recognized field must remain.
pub fn validate_profile(req: &UpdateProfileRequest) -> Result<ProfileChanges, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let mut changes = ProfileChanges::default();

    if let Some(full_name) = clean(req.full_name.as_ref()) {
        if !(2..=255).contains(&full_name.chars().count()) {
            errors.push("full_name", "Full name must be between 2 and 255 characters");
        }
        changes.full_name = Some(full_name);
    }

    if let Some(code) = req.gender.as_deref().map(str::trim) {
        match Gender::from_code(code) {
            Some(gender) => changes.gender = Some(gender),
            None => errors.push("gender", "Gender must be m (male), f (female), or o (other)"),
        }
    }

    if let Some(mobile_no) = clean(req.mobile_no.as_ref()) {
        if !is_valid_phone(&mobile_no) {
            errors.push(
                "mobile_no",
                "Please provide a valid mobile number with country code (E.164 format)",
            );
        }
        changes.mobile_no = Some(mobile_no);
    }

    if errors.is_empty() && changes.is_empty() {
        errors.push("body", "No valid fields to update");
    }
    errors.finish(changes)
}

/// Validate a password change.
pub fn validate_password_change(req: &ChangePasswordRequest) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if req.current_password.is_empty() {
        errors.push("current_password", "Current password is required");
    }
    check_new_password(&mut errors, "new_password", &req.new_password);
    errors.finish(())
}

/// Validate a company payload for creation; `company_name` is required.
pub fn validate_new_company(req: &CompanyRequest) -> Result<NewCompany, ValidationErrors> {
    let changes = validate_company_fields(req, true)?;
    Ok(NewCompany {
        company_name: changes.company_name.unwrap_or_default(),
        address: changes.address,
        city: changes.city,
        state: changes.state,
        country: changes.country,
        postal_code: changes.postal_code,
        website: changes.website,
        logo_url: changes.logo_url,
        banner_url: changes.banner_url,
        industry: changes.industry,
        organization_type: changes.organization_type,
        team_size: changes.team_size,
        founded_date: changes.founded_date,
        description: changes.description,
        social_links: changes.social_links,
    })
}

/// Validate a company payload for a partial update.
pub fn validate_company_changes(req: &CompanyRequest) -> Result<CompanyChanges, ValidationErrors> {
    validate_company_fields(req, false)
}

fn validate_company_fields(
    req: &CompanyRequest,
    require_name: bool,
) -> Result<CompanyChanges, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let company_name = clean(req.company_name.as_ref());
    match &company_name {
        None if require_name => errors.push("company_name", "Company name is required"),
        Some(name) if !(2..=255).contains(&name.chars().count()) => errors.push(
            "company_name",
            "Company name must be between 2 and 255 characters",
        ),
        _ => {}
    }

    let address = clean(req.address.as_ref());
    let city = clean(req.city.as_ref());
    let state = clean(req.state.as_ref());
    let country = clean(req.country.as_ref());
    let postal_code = clean(req.postal_code.as_ref());
    let industry = clean(req.industry.as_ref());
    let description = clean(req.description.as_ref());

    for (field, value, max, label) in [
        ("address", &address, 500, "Address"),
        ("city", &city, 100, "City"),
        ("state", &state, 100, "State"),
        ("country", &country, 100, "Country"),
        ("postal_code", &postal_code, 20, "Postal code"),
        ("industry", &industry, 100, "Industry"),
        ("description", &description, 2000, "Description"),
    ] {
        if let Some(value) = value {
            check_length(&mut errors, field, value, max, label);
        }
    }

    let website = clean(req.website.as_ref());
    let logo_url = clean(req.logo_url.as_ref());
    let banner_url = clean(req.banner_url.as_ref());
    for (field, value, message) in [
        ("website", &website, "Please provide a valid website URL"),
        ("logo_url", &logo_url, "Please provide a valid logo URL"),
        ("banner_url", &banner_url, "Please provide a valid banner URL"),
    ] {
        if value.as_deref().is_some_and(|v| !is_valid_url(v)) {
            errors.push(field, message);
        }
    }

    let founded_date = match req.founded_date.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => {
            let parsed = parse_date(raw);
            if parsed.is_none() {
                errors.push(
                    "founded_date",
                    "Please provide a valid date in YYYY-MM-DD format",
                );
            }
            parsed
        }
    };

    let social_links = match &req.social_links {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::Object(links)) => {
            check_social_links(&mut errors, links);
            Some(links.clone())
        }
        Some(_) => {
            errors.push("social_links", "Social links must be an object");
            None
        }
    };

    let changes = CompanyChanges {
        company_name,
        address,
        city,
        state,
        country,
        postal_code,
        website,
        logo_url,
        banner_url,
        industry,
        organization_type: clean(req.organization_type.as_ref()),
        team_size: clean(req.team_size.as_ref()),
        founded_date,
        description,
        social_links,
    };
    errors.finish(changes)
}

fn check_social_links(errors: &mut ValidationErrors, links: &SocialLinks) {
    for (key, label) in SOCIAL_NETWORKS {
        let valid = match links.get(*key) {
            None | Some(serde_json::Value::Null) => true,
            Some(serde_json::Value::String(url)) => is_valid_url(url),
            Some(_) => false,
        };
        if !valid {
            errors.push(
                &format!("social_links.{key}"),
                &format!("{label} URL must be valid"),
            );
        }
    }
}

/// Parse a path id: an integer of at least 1.
pub fn parse_id(raw: &str) -> Result<u64, ValidationErrors> {
    match raw.trim().parse::<u64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(ValidationErrors::single("id", "Invalid ID parameter")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(email: &str, password: &str, gender: &str, mobile: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            full_name: "Ada Lovelace".to_string(),
            gender: gender.to_string(),
            mobile_no: mobile.to_string(),
            firebase_uid: None,
        }
    }

    #[test]
    fn sanitize_strips_markup() {
        assert_eq!(sanitize("  <b>Acme</b> Corp "), "Acme Corp");
        assert_eq!(sanitize("Hi<script>alert(1)</script>!"), "Hi!");
        assert_eq!(sanitize("<STYLE type=x>p{}</STYLE>ok"), "ok");
        assert_eq!(sanitize("a < b"), "a < b");
        assert_eq!(
            sanitize("Margins < 5% and <i>growing</i> > 2x"),
            "Margins < 5% and growing > 2x"
        );
        assert_eq!(sanitize("churn <2% <b"), "churn <2% <b");
        assert_eq!(sanitize("plain"), "plain");
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("a x@y.com"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("a@@x.com"));
    }

    #[test]
    fn phone_is_e164() {
        assert!(is_valid_phone("+919876543210"));
        assert!(is_valid_phone("15550001"));
        assert!(!is_valid_phone("+0123"));
        assert!(!is_valid_phone("+1"));
        assert!(!is_valid_phone("+1234567890123456"));
        assert!(!is_valid_phone("+1-555-0001"));
    }

    #[test]
    fn url_shapes() {
        assert!(is_valid_url("https://acme.example/about"));
        assert!(is_valid_url("acme.com"));
        assert!(!is_valid_url("not a url"));
        assert!(!is_valid_url("javascript:alert(1)"));
        assert!(!is_valid_url("http://localhost"));
    }

    #[test]
    fn password_strength_levels() {
        assert_eq!(
            check_password_strength("Passw0rd!").strength,
            PasswordStrength::Medium
        );
        assert_eq!(
            check_password_strength("LongerPassw0rd!").strength,
            PasswordStrength::Strong
        );
        let weak = check_password_strength("password");
        assert!(!weak.is_valid());
        assert_eq!(weak.strength, PasswordStrength::Weak);
        assert_eq!(weak.errors.len(), 3);
    }

    #[test]
    fn register_normalizes_and_accepts() {
        let user = validate_register(&register(
            "Ada@X.com",
            "Passw0rd!",
            "f",
            "+15550001",
        ))
        .unwrap();
        assert_eq!(user.email, "ada@x.com");
        assert_eq!(user.gender, Gender::Female);
        assert_eq!(user.signup_type, "e");
    }

    #[test]
    fn register_reports_every_field() {
        let errors = validate_register(&RegisterRequest::default()).unwrap_err();
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(
            fields,
            vec!["email", "password", "full_name", "gender", "mobile_no"]
        );
    }

    #[test]
    fn register_rejects_weak_password() {
        let errors =
            validate_register(&register("a@x.com", "password1", "m", "+15550001")).unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["password"]);
    }

    #[test]
    fn login_requires_password() {
        let errors = validate_login(&LoginRequest {
            email: "a@x.com".to_string(),
            password: String::new(),
        })
        .unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["password"]);
    }

    #[test]
    fn otp_rules() {
        let req = |otp: &str| VerifyMobileRequest {
            mobile_no: "+15550001".to_string(),
            otp_code: otp.to_string(),
        };
        assert!(validate_mobile_verification(&req("1234")).is_ok());
        assert!(validate_mobile_verification(&req("123")).is_err());
        assert!(validate_mobile_verification(&req("12a4")).is_err());
        assert!(validate_mobile_verification(&req("1234567")).is_err());
    }

    #[test]
    fn empty_profile_update_is_rejected() {
        let errors = validate_profile(&UpdateProfileRequest::default()).unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["body"]);

        let changes = validate_profile(&UpdateProfileRequest {
            gender: Some("o".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(changes.gender, Some(Gender::Other));
    }

    #[test]
    fn company_requires_name_on_create_only() {
        let req = CompanyRequest {
            city: Some("Pune".to_string()),
            ..Default::default()
        };
        assert!(validate_new_company(&req).is_err());
        let changes = validate_company_changes(&req).unwrap();
        assert_eq!(changes.city.as_deref(), Some("Pune"));
        assert!(changes.company_name.is_none());
    }

    #[test]
    fn company_field_rules() {
        let req = CompanyRequest {
            company_name: Some("<i>A</i>".to_string()),
            postal_code: Some("1".repeat(21)),
            website: Some("nope".to_string()),
            founded_date: Some("2020-13-01".to_string()),
            social_links: Some(serde_json::json!({"twitter": "bad url", "github": 5})),
            ..Default::default()
        };
        let errors = validate_new_company(&req).unwrap_err();
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec![
                "company_name",
                "postal_code",
                "website",
                "founded_date",
                "social_links.twitter"
            ]
        );

        let req = CompanyRequest {
            company_name: Some("Acme".to_string()),
            social_links: Some(serde_json::json!("https://x.com")),
            ..Default::default()
        };
        let errors = validate_new_company(&req).unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["social_links"]);
    }

    #[test]
    fn company_sanitizes_and_parses() {
        let company = validate_new_company(&CompanyRequest {
            company_name: Some(" <b>Acme</b> ".to_string()),
            founded_date: Some("2001-02-03".to_string()),
            social_links: Some(serde_json::json!({"linkedin": "https://linkedin.com/acme"})),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(company.company_name, "Acme");
        assert_eq!(
            company.founded_date,
            NaiveDate::from_ymd_opt(2001, 2, 3)
        );
        assert!(company.social_links.unwrap().contains_key("linkedin"));
    }

    #[test]
    fn id_must_be_positive_integer() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert!(parse_id("0").is_err());
        assert!(parse_id("-1").is_err());
        assert!(parse_id("abc").is_err());
    }
}
