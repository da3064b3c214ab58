//! Seed CMS content from a YAML file.
//!
//! The file has one optional list per collection, keyed by the same slug
//! the admin API uses:
//!
//! ```yaml
//! services:
//!   - title: Live musicians
//!     description: Soloists and ensembles for the service
//! pricing:
//!   - name: Standard
//!     price: 149.00
//!     features: [Five songs, Order of service]
//!     isPopular: true
//! how-it-works:
//!   - title: Choose your music
//! ```
//!
//! Every entry is validated with the same rules as the admin API before the
//! database is touched. Entries without an `order` take their position in
//! the list.

use std::path::Path;

use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{error, info};

use mff_server::db::{ContentRepository, RepositoryError};
use mff_server::models::content::{
    Collection, ColumnValue, ContentEntity, ContentInput, ContentSection, ContentSectionFields,
    DemoVideo, DemoVideoFields, FaqItem, FaqItemFields, HowItWorksFields, HowItWorksItem,
    PricingPlan, PricingPlanFields, ServiceItem, ServiceItemFields,
};

use super::{ConnectError, connect};

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Cannot read {0}: {1}")]
    Read(String, std::io::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0} validation errors found")]
    Invalid(usize),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Contents of a seed file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedFile {
    #[serde(default)]
    pub services: Vec<ContentInput<ServiceItemFields>>,
    #[serde(default)]
    pub pricing: Vec<ContentInput<PricingPlanFields>>,
    #[serde(default)]
    pub faqs: Vec<ContentInput<FaqItemFields>>,
    #[serde(default, rename = "how-it-works")]
    pub how_it_works: Vec<ContentInput<HowItWorksFields>>,
    #[serde(default)]
    pub sections: Vec<ContentInput<ContentSectionFields>>,
    #[serde(default)]
    pub videos: Vec<ContentInput<DemoVideoFields>>,
}

/// A validated entry ready to insert.
#[derive(Debug)]
struct Row {
    columns: Vec<(&'static str, ColumnValue)>,
    display_order: i32,
    is_active: bool,
}

/// Validated rows for one collection.
#[derive(Debug)]
struct Batch {
    collection: Collection,
    rows: Vec<Row>,
}

/// Every collection's validated rows, in dashboard order.
#[derive(Debug)]
struct Plan {
    services: Batch,
    pricing: Batch,
    faqs: Batch,
    how_it_works: Batch,
    sections: Batch,
    videos: Batch,
}

impl Plan {
    /// Validate every entry, collecting all problems rather than stopping at
    /// the first.
    fn build(file: SeedFile) -> Result<Self, Vec<String>> {
        let mut errors = Vec::new();
        let plan = Self {
            services: prepare::<ServiceItem>(Collection::Services, file.services, &mut errors),
            pricing: prepare::<PricingPlan>(Collection::Pricing, file.pricing, &mut errors),
            faqs: prepare::<FaqItem>(Collection::Faqs, file.faqs, &mut errors),
            how_it_works: prepare::<HowItWorksItem>(
                Collection::HowItWorks,
                file.how_it_works,
                &mut errors,
            ),
            sections: prepare::<ContentSection>(Collection::Sections, file.sections, &mut errors),
            videos: prepare::<DemoVideo>(Collection::Videos, file.videos, &mut errors),
        };

        if errors.is_empty() {
            Ok(plan)
        } else {
            Err(errors)
        }
    }

    fn len(&self) -> usize {
        [
            &self.services,
            &self.pricing,
            &self.faqs,
            &self.how_it_works,
            &self.sections,
            &self.videos,
        ]
        .iter()
        .map(|b| b.rows.len())
        .sum()
    }
}

fn prepare<T: ContentEntity>(
    collection: Collection,
    inputs: Vec<ContentInput<T::Fields>>,
    errors: &mut Vec<String>,
) -> Batch {
    let mut rows = Vec::with_capacity(inputs.len());
    for (position, input) in inputs.into_iter().enumerate() {
        let fallback_order = i32::try_from(position).unwrap_or(i32::MAX);
        match T::columns(input.fields) {
            Ok(columns) => rows.push(Row {
                columns,
                display_order: input.order.unwrap_or(fallback_order),
                is_active: input.is_active.unwrap_or(true),
            }),
            Err(message) => errors.push(format!(
                "{}[{position}]: {message}",
                collection.slug()
            )),
        }
    }
    Batch { collection, rows }
}

/// Seed content from `file_path`.
///
/// With `replace`, each collection that has entries in the file is emptied
/// first; the others are untouched.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, any entry is
/// invalid, or database operations fail.
pub async fn content(file_path: &str, replace: bool) -> Result<(), SeedError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading content from file");

    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SeedError::Read(file_path.to_owned(), e))?;
    let file: SeedFile = serde_yaml::from_str(&raw)?;

    // Validate before connecting to the database
    let plan = match Plan::build(file) {
        Ok(plan) => plan,
        Err(errors) => {
            error!("Content validation failed:");
            for err in &errors {
                error!("  - {err}");
            }
            return Err(SeedError::Invalid(errors.len()));
        }
    };
    info!(entries = plan.len(), "Content validated successfully");

    let pool = connect().await?;

    let inserted = [
        insert::<ServiceItem>(&pool, plan.services, replace).await?,
        insert::<PricingPlan>(&pool, plan.pricing, replace).await?,
        insert::<FaqItem>(&pool, plan.faqs, replace).await?,
        insert::<HowItWorksItem>(&pool, plan.how_it_works, replace).await?,
        insert::<ContentSection>(&pool, plan.sections, replace).await?,
        insert::<DemoVideo>(&pool, plan.videos, replace).await?,
    ];

    info!("Seeding complete!");
    for (collection, count) in inserted.into_iter().flatten() {
        info!("  {}: {count} inserted", collection.label());
    }
    Ok(())
}

async fn insert<T: ContentEntity>(
    pool: &PgPool,
    batch: Batch,
    replace: bool,
) -> Result<Option<(Collection, usize)>, RepositoryError> {
    if batch.rows.is_empty() {
        return Ok(None);
    }

    let repo = ContentRepository::<T>::new(pool);
    if replace {
        let removed = repo.clear().await?;
        info!(collection = batch.collection.slug(), removed, "Cleared existing content");
    }

    let count = batch.rows.len();
    for row in batch.rows {
        repo.create(row.columns, row.display_order, row.is_active)
            .await?;
    }
    Ok(Some((batch.collection, count)))
}
