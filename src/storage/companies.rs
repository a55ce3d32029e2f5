// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Company profile repository.
//!
//! A user owns at most one company profile, enforced by the
//! `companies_by_owner` index. The owner of a profile never changes.

use chrono::{DateTime, NaiveDate, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{
    next_id, read_row, Database, OwnedResource, QueryTimer, StorageError, StorageResult,
    StoredUser, COMPANIES, COMPANIES_BY_OWNER, USERS,
};

pub const OWNER_CONSTRAINT: &str = "unique_owner";

/// Country recorded when none is given.
pub const DEFAULT_COUNTRY: &str = "India";

/// Free-form social profile links, keyed by network name.
pub type SocialLinks = serde_json::Map<String, serde_json::Value>;

/// Company profile row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StoredCompany {
    pub id: u64,
    pub owner_id: u64,
    pub company_name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: String,
    pub postal_code: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub banner_url: Option<String>,
    pub industry: Option<String>,
    pub organization_type: Option<String>,
    pub team_size: Option<String>,
    pub founded_date: Option<NaiveDate>,
    pub description: Option<String>,
    #[schema(value_type = Object)]
    pub social_links: SocialLinks,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OwnedResource for StoredCompany {
    fn owner_id(&self) -> u64 {
        self.owner_id
    }

    fn kind() -> &'static str {
        "company"
    }
}

/// Input for [`CompanyRepository::create`].
#[derive(Debug, Clone, Default)]
pub struct NewCompany {
    pub company_name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub banner_url: Option<String>,
    pub industry: Option<String>,
    pub organization_type: Option<String>,
    pub team_size: Option<String>,
    pub founded_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub social_links: Option<SocialLinks>,
}

/// Partial update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyChanges {
    pub company_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub banner_url: Option<String>,
    pub industry: Option<String>,
    pub organization_type: Option<String>,
    pub team_size: Option<String>,
    pub founded_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub social_links: Option<SocialLinks>,
}

impl CompanyChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn apply(self, company: &mut StoredCompany) {
        fn set<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        if let Some(name) = self.company_name {
            company.company_name = name;
        }
        if let Some(country) = self.country {
            company.country = country;
        }
        if let Some(links) = self.social_links {
            company.social_links = links;
        }
        set(&mut company.address, self.address);
        set(&mut company.city, self.city);
        set(&mut company.state, self.state);
        set(&mut company.postal_code, self.postal_code);
        set(&mut company.website, self.website);
        set(&mut company.logo_url, self.logo_url);
        set(&mut company.banner_url, self.banner_url);
        set(&mut company.industry, self.industry);
        set(&mut company.organization_type, self.organization_type);
        set(&mut company.team_size, self.team_size);
        set(&mut company.founded_date, self.founded_date);
        set(&mut company.description, self.description);
    }
}

/// Company joined with its owner's public contact details.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CompanyWithOwner {
    #[serde(flatten)]
    pub company: StoredCompany,
    pub owner_email: String,
    pub owner_name: String,
    pub owner_mobile: String,
}

/// Listing row: company plus owner name.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CompanySummary {
    #[serde(flatten)]
    pub company: StoredCompany,
    pub owner_name: String,
}

/// One page of the company directory.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CompanyPage {
    pub companies: Vec<CompanySummary>,
    pub total: u64,
    pub page: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
}

/// Repository for company profile rows.
pub struct CompanyRepository<'a> {
    db: &'a Database,
}

impl<'a> CompanyRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn find_by_id(&self, id: u64) -> StorageResult<Option<StoredCompany>> {
        let _timer = QueryTimer::start("companies.find_by_id");
        let read_txn = self.db.redb().begin_read()?;
        let companies = read_txn.open_table(COMPANIES)?;
        read_row(&companies, id)
    }

    pub fn find_by_owner(&self, owner_id: u64) -> StorageResult<Option<StoredCompany>> {
        let _timer = QueryTimer::start("companies.find_by_owner");
        let read_txn = self.db.redb().begin_read()?;
        let owners = read_txn.open_table(COMPANIES_BY_OWNER)?;
        let Some(company_id) = owners.get(owner_id)?.map(|v| v.value()) else {
            return Ok(None);
        };
        let companies = read_txn.open_table(COMPANIES)?;
        read_row(&companies, company_id)
    }

    /// Company with owner contact details, for the public detail view.
    pub fn find_with_owner(&self, id: u64) -> StorageResult<Option<CompanyWithOwner>> {
        let _timer = QueryTimer::start("companies.find_with_owner");
        let read_txn = self.db.redb().begin_read()?;
        let companies = read_txn.open_table(COMPANIES)?;
        let Some(company) = read_row::<StoredCompany>(&companies, id)? else {
            return Ok(None);
        };
        let users = read_txn.open_table(USERS)?;
        let Some(owner) = read_row::<StoredUser>(&users, company.owner_id)? else {
            return Ok(None);
        };

        Ok(Some(CompanyWithOwner {
            company,
            owner_email: owner.email,
            owner_name: owner.full_name,
            owner_mobile: owner.mobile_no,
        }))
    }

    /// Case-insensitive substring match on the company name, newest first.
    pub fn find_by_name(&self, query: &str) -> StorageResult<Vec<StoredCompany>> {
        let _timer = QueryTimer::start("companies.find_by_name");
        let needle = query.to_lowercase();
        self.scan(|company| company.company_name.to_lowercase().contains(&needle))
    }

    /// Case-insensitive substring match on the industry, newest first.
    pub fn find_by_industry(&self, industry: &str) -> StorageResult<Vec<StoredCompany>> {
        let _timer = QueryTimer::start("companies.find_by_industry");
        let needle = industry.to_lowercase();
        self.scan(|company| {
            company
                .industry
                .as_deref()
                .is_some_and(|i| i.to_lowercase().contains(&needle))
        })
    }

    /// Paginated directory listing, newest first. `page` starts at 1.
    pub fn list(&self, page: u64, limit: u64) -> StorageResult<CompanyPage> {
        let _timer = QueryTimer::start("companies.list");
        let page = page.max(1);
        let limit = limit.max(1);

        let all = self.scan(|_| true)?;
        let total = all.len() as u64;
        let offset = (page - 1).saturating_mul(limit);

        let read_txn = self.db.redb().begin_read()?;
        let users = read_txn.open_table(USERS)?;
        let mut companies = Vec::new();
        for company in all
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
        {
            let owner_name = read_row::<StoredUser>(&users, company.owner_id)?
                .map(|owner| owner.full_name)
                .unwrap_or_default();
            companies.push(CompanySummary {
                company,
                owner_name,
            });
        }

        Ok(CompanyPage {
            companies,
            total,
            page,
            total_pages: total.div_ceil(limit),
        })
    }

    /// Create the owner's company profile.
    ///
    /// # Errors
    /// `StorageError::UniqueViolation` if the owner already has one.
    pub fn create(&self, owner_id: u64, new: NewCompany) -> StorageResult<StoredCompany> {
        let _timer = QueryTimer::start("companies.create");
        let now = Utc::now();

        let write_txn = self.db.redb().begin_write()?;
        let company = {
            let mut owners = write_txn.open_table(COMPANIES_BY_OWNER)?;
            if owners.get(owner_id)?.is_some() {
                return Err(StorageError::UniqueViolation {
                    constraint: OWNER_CONSTRAINT,
                });
            }

            let id = next_id(&write_txn, "companies")?;
            let company = StoredCompany {
                id,
                owner_id,
                company_name: new.company_name,
                address: new.address,
                city: new.city,
                state: new.state,
                country: new.country.unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
                postal_code: new.postal_code,
                website: new.website,
                logo_url: new.logo_url,
                banner_url: new.banner_url,
                industry: new.industry,
                organization_type: new.organization_type,
                team_size: new.team_size,
                founded_date: new.founded_date,
                description: new.description,
                social_links: new.social_links.unwrap_or_default(),
                created_at: now,
                updated_at: now,
            };

            let json = serde_json::to_vec(&company)?;
            write_txn
                .open_table(COMPANIES)?
                .insert(id, json.as_slice())?;
            owners.insert(owner_id, id)?;
            company
        };
        write_txn.commit()?;

        tracing::info!(company_id = company.id, owner_id, "Company profile created");
        Ok(company)
    }

    /// Apply a partial update.
    pub fn update(&self, id: u64, changes: CompanyChanges) -> StorageResult<StoredCompany> {
        let _timer = QueryTimer::start("companies.update");

        let write_txn = self.db.redb().begin_write()?;
        let company = {
            let mut companies = write_txn.open_table(COMPANIES)?;
            let Some(mut company) = read_row::<StoredCompany>(&companies, id)? else {
                return Err(StorageError::NotFound(format!("Company {id}")));
            };
            changes.apply(&mut company);
            company.updated_at = Utc::now();

            let json = serde_json::to_vec(&company)?;
            companies.insert(id, json.as_slice())?;
            company
        };
        write_txn.commit()?;
        Ok(company)
    }

    /// Delete a company profile. Returns `false` if absent.
    pub fn delete(&self, id: u64) -> StorageResult<bool> {
        let _timer = QueryTimer::start("companies.delete");

        let write_txn = self.db.redb().begin_write()?;
        {
            let mut companies = write_txn.open_table(COMPANIES)?;
            let Some(company) = read_row::<StoredCompany>(&companies, id)? else {
                return Ok(false);
            };
            companies.remove(id)?;
            write_txn
                .open_table(COMPANIES_BY_OWNER)?
                .remove(company.owner_id)?;
        }
        write_txn.commit()?;

        tracing::info!(company_id = id, "Company profile deleted");
        Ok(true)
    }

    /// All companies matching `keep`, newest first.
    fn scan<F>(&self, keep: F) -> StorageResult<Vec<StoredCompany>>
    where
        F: Fn(&StoredCompany) -> bool,
    {
        let read_txn = self.db.redb().begin_read()?;
        let table = read_txn.open_table(COMPANIES)?;

        let mut matches = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let company: StoredCompany = serde_json::from_slice(value.value())?;
            if keep(&company) {
                matches.push(company);
            }
        }

        matches.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::open_temp;
    use crate::storage::users::tests::new_user;

    fn new_company(name: &str, industry: &str) -> NewCompany {
        NewCompany {
            company_name: name.to_string(),
            industry: Some(industry.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn create_applies_defaults() {
        let (db, _dir) = open_temp();
        let owner = db.users().create(new_user("a@x.com", "+15550001")).unwrap();

        let company = db
            .companies()
            .create(owner.id, new_company("Acme", "Manufacturing"))
            .unwrap();
        assert_eq!(company.owner_id, owner.id);
        assert_eq!(company.country, DEFAULT_COUNTRY);
        assert!(company.social_links.is_empty());

        let found = db.companies().find_by_owner(owner.id).unwrap().unwrap();
        assert_eq!(found.id, company.id);
        assert_eq!(found.owner_id, owner.id);
    }

    #[test]
    fn one_company_per_owner() {
        let (db, _dir) = open_temp();
        let owner = db.users().create(new_user("a@x.com", "+15550001")).unwrap();
        db.companies()
            .create(owner.id, new_company("Acme", "Tech"))
            .unwrap();

        let err = db
            .companies()
            .create(owner.id, new_company("Acme Two", "Tech"))
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::UniqueViolation {
                constraint: OWNER_CONSTRAINT
            }
        ));
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let (db, _dir) = open_temp();
        let a = db.users().create(new_user("a@x.com", "+15550001")).unwrap();
        let b = db.users().create(new_user("b@x.com", "+15550002")).unwrap();
        db.companies()
            .create(a.id, new_company("Acme Widgets", "Software"))
            .unwrap();
        db.companies()
            .create(b.id, new_company("Globex", "Hardware"))
            .unwrap();

        let found = db.companies().find_by_name("acme").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].company_name, "Acme Widgets");

        let found = db.companies().find_by_industry("WARE").unwrap();
        assert_eq!(found.len(), 2);
        // Newest first
        assert_eq!(found[0].company_name, "Globex");
    }

    #[test]
    fn partial_update_keeps_other_fields() {
        let (db, _dir) = open_temp();
        let owner = db.users().create(new_user("a@x.com", "+15550001")).unwrap();
        let company = db
            .companies()
            .create(owner.id, new_company("Acme", "Tech"))
            .unwrap();

        let updated = db
            .companies()
            .update(
                company.id,
                CompanyChanges {
                    city: Some("Pune".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.city.as_deref(), Some("Pune"));
        assert_eq!(updated.company_name, "Acme");
        assert_eq!(updated.industry.as_deref(), Some("Tech"));
        assert!(CompanyChanges::default().is_empty());
    }

    #[test]
    fn delete_frees_owner_slot() {
        let (db, _dir) = open_temp();
        let owner = db.users().create(new_user("a@x.com", "+15550001")).unwrap();
        let company = db
            .companies()
            .create(owner.id, new_company("Acme", "Tech"))
            .unwrap();

        assert!(db.companies().delete(company.id).unwrap());
        assert!(!db.companies().delete(company.id).unwrap());
        assert!(db.companies().find_by_owner(owner.id).unwrap().is_none());
        db.companies()
            .create(owner.id, new_company("Acme Again", "Tech"))
            .unwrap();
    }

    #[test]
    fn deleting_owner_cascades() {
        let (db, _dir) = open_temp();
        let owner = db.users().create(new_user("a@x.com", "+15550001")).unwrap();
        let company = db
            .companies()
            .create(owner.id, new_company("Acme", "Tech"))
            .unwrap();

        db.users().delete(owner.id).unwrap();
        assert!(db.companies().find_by_id(company.id).unwrap().is_none());
    }

    #[test]
    fn detail_includes_owner_contact() {
        let (db, _dir) = open_temp();
        let owner = db.users().create(new_user("a@x.com", "+15550001")).unwrap();
        let company = db
            .companies()
            .create(owner.id, new_company("Acme", "Tech"))
            .unwrap();

        let detail = db.companies().find_with_owner(company.id).unwrap().unwrap();
        assert_eq!(detail.owner_email, "a@x.com");
        assert_eq!(detail.owner_mobile, "+15550001");

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["company_name"], "Acme");
        assert_eq!(json["owner_name"], "Ada Lovelace");
    }

    #[test]
    fn list_paginates() {
        let (db, _dir) = open_temp();
        for i in 0..5 {
            let owner = db
                .users()
                .create(new_user(&format!("u{i}@x.com"), &format!("+1555000{i}")))
                .unwrap();
            db.companies()
                .create(owner.id, new_company(&format!("Company {i}"), "Tech"))
                .unwrap();
        }

        let page = db.companies().list(2, 2).unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.page, 2);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.companies.len(), 2);
        assert_eq!(page.companies[0].company.company_name, "Company 2");

        let last = db.companies().list(3, 2).unwrap();
        assert_eq!(last.companies.len(), 1);
        assert_eq!(last.companies[0].owner_name, "Ada Lovelace");
    }
}
