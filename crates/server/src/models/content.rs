//! Marketing-site content managed from the admin CMS.
//!
//! Six entity kinds share the same shape: a UUID, a display order, an active
//! flag and timestamps, plus a handful of entity-specific columns. Each kind
//! implements [`ContentEntity`], which is all the generic repository and
//! handlers need to list, create, update and delete it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use uuid::Uuid;

const MAX_TITLE_LENGTH: usize = 200;
const MAX_BODY_LENGTH: usize = 20_000;
const MAX_SECTION_KEY_LENGTH: usize = 64;

/// A typed value for one entity-specific column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Text(String),
    OptText(Option<String>),
    Decimal(Decimal),
    Bool(bool),
    TextList(Vec<String>),
}

/// A content table the CMS can manage.
pub trait ContentEntity:
    for<'r> sqlx::FromRow<'r, PgRow> + Serialize + Send + Sync + Unpin + 'static
{
    /// Fully qualified table name.
    const TABLE: &'static str;
    /// Human-readable name used in error messages.
    const NAME: &'static str;
    /// Entity-specific request fields.
    type Fields: DeserializeOwned + Send + 'static;

    /// Validate `fields` and turn them into `(column, value)` pairs.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    fn columns(fields: Self::Fields) -> Result<Vec<(&'static str, ColumnValue)>, String>;
}

/// Request body for creating or replacing a content entity.
///
/// `order` and `isActive` are optional: creation falls back to `0`/`true`,
/// updates keep the stored values.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentInput<F> {
    #[serde(flatten)]
    pub fields: F,
    pub order: Option<i32>,
    pub is_active: Option<bool>,
}

/// The content collections, by their URL slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Services,
    Pricing,
    Faqs,
    HowItWorks,
    Sections,
    Videos,
}

impl Collection {
    /// Every collection, in dashboard order.
    pub const ALL: [Self; 6] = [
        Self::Services,
        Self::Pricing,
        Self::Faqs,
        Self::HowItWorks,
        Self::Sections,
        Self::Videos,
    ];

    /// Path segment under `/api/admin` and `/api/content`.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Services => "services",
            Self::Pricing => "pricing",
            Self::Faqs => "faqs",
            Self::HowItWorks => "how-it-works",
            Self::Sections => "sections",
            Self::Videos => "videos",
        }
    }

    /// Heading shown on the admin dashboard.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Services => "Services",
            Self::Pricing => "Pricing plans",
            Self::Faqs => "FAQs",
            Self::HowItWorks => "How it works",
            Self::Sections => "Content sections",
            Self::Videos => "Demo videos",
        }
    }

    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.slug() == slug)
    }
}

// =============================================================================
// Entities
// =============================================================================

/// A service offered, shown on the home page.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ServiceItem {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    #[serde(rename = "order")]
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceItemFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

impl ContentEntity for ServiceItem {
    const TABLE: &'static str = "mff.service_items";
    const NAME: &'static str = "service item";
    type Fields = ServiceItemFields;

    fn columns(fields: Self::Fields) -> Result<Vec<(&'static str, ColumnValue)>, String> {
        Ok(vec![
            ("title", required_text(fields.title, "title", MAX_TITLE_LENGTH)?),
            ("description", optional_text(fields.description)),
            ("icon", optional_text(fields.icon)),
        ])
    }
}

/// A purchasable plan on the pricing page.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PricingPlan {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub features: Vec<String>,
    pub is_popular: bool,
    #[serde(rename = "order")]
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingPlanFields {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub is_popular: bool,
}

impl ContentEntity for PricingPlan {
    const TABLE: &'static str = "mff.pricing_plans";
    const NAME: &'static str = "pricing plan";
    type Fields = PricingPlanFields;

    fn columns(fields: Self::Fields) -> Result<Vec<(&'static str, ColumnValue)>, String> {
        let name = required_text(fields.name, "name", MAX_TITLE_LENGTH)?;
        let price = super::check_price(fields.price.ok_or("price is required")?, "price")?;
        let features = fields
            .features
            .into_iter()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();

        Ok(vec![
            ("name", name),
            ("price", ColumnValue::Decimal(price)),
            ("description", optional_text(fields.description)),
            ("features", ColumnValue::TextList(features)),
            ("is_popular", ColumnValue::Bool(fields.is_popular)),
        ])
    }
}

/// A frequently asked question.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FaqItem {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    #[serde(rename = "order")]
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaqItemFields {
    pub question: Option<String>,
    pub answer: Option<String>,
}

impl ContentEntity for FaqItem {
    const TABLE: &'static str = "mff.faq_items";
    const NAME: &'static str = "FAQ item";
    type Fields = FaqItemFields;

    fn columns(fields: Self::Fields) -> Result<Vec<(&'static str, ColumnValue)>, String> {
        Ok(vec![
            ("question", required_text(fields.question, "question", MAX_BODY_LENGTH)?),
            ("answer", required_text(fields.answer, "answer", MAX_BODY_LENGTH)?),
        ])
    }
}

/// One step of the "how it works" walkthrough.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HowItWorksItem {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    #[serde(rename = "order")]
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HowItWorksFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

impl ContentEntity for HowItWorksItem {
    const TABLE: &'static str = "mff.how_it_works_items";
    const NAME: &'static str = "how-it-works item";
    type Fields = HowItWorksFields;

    fn columns(fields: Self::Fields) -> Result<Vec<(&'static str, ColumnValue)>, String> {
        Ok(vec![
            ("title", required_text(fields.title, "title", MAX_TITLE_LENGTH)?),
            ("description", optional_text(fields.description)),
            ("icon", optional_text(fields.icon)),
        ])
    }
}

/// A keyed block of page copy (hero, about, contact...).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ContentSection {
    pub id: Uuid,
    pub section_key: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub body: Option<String>,
    pub image_url: Option<String>,
    #[serde(rename = "order")]
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSectionFields {
    pub section_key: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub body: Option<String>,
    pub image_url: Option<String>,
}

impl ContentEntity for ContentSection {
    const TABLE: &'static str = "mff.content_sections";
    const NAME: &'static str = "content section";
    type Fields = ContentSectionFields;

    fn columns(fields: Self::Fields) -> Result<Vec<(&'static str, ColumnValue)>, String> {
        let key = required_text(fields.section_key, "sectionKey", MAX_SECTION_KEY_LENGTH)?;
        if let ColumnValue::Text(k) = &key
            && !k
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
        {
            return Err(
                "sectionKey may only contain lowercase letters, digits, '-' and '_'".to_string(),
            );
        }

        Ok(vec![
            ("section_key", key),
            ("title", required_text(fields.title, "title", MAX_TITLE_LENGTH)?),
            ("subtitle", optional_text(fields.subtitle)),
            ("body", optional_text(fields.body)),
            ("image_url", optional_url(fields.image_url, "imageUrl")?),
        ])
    }
}

/// A demonstration video.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DemoVideo {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    #[serde(rename = "order")]
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoVideoFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
}

impl ContentEntity for DemoVideo {
    const TABLE: &'static str = "mff.demo_videos";
    const NAME: &'static str = "demo video";
    type Fields = DemoVideoFields;

    fn columns(fields: Self::Fields) -> Result<Vec<(&'static str, ColumnValue)>, String> {
        let video_url = match optional_url(fields.video_url, "videoUrl")? {
            ColumnValue::OptText(Some(url)) => ColumnValue::Text(url),
            _ => return Err("videoUrl is required".to_string()),
        };

        Ok(vec![
            ("title", required_text(fields.title, "title", MAX_TITLE_LENGTH)?),
            ("description", optional_text(fields.description)),
            ("video_url", video_url),
            ("thumbnail_url", optional_url(fields.thumbnail_url, "thumbnailUrl")?),
        ])
    }
}

// =============================================================================
// Field helpers
// =============================================================================

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required_text(value: Option<String>, field: &str, max: usize) -> Result<ColumnValue, String> {
    let value = trimmed(value).ok_or_else(|| format!("{field} is required"))?;
    if value.chars().count() > max {
        return Err(format!("{field} must be at most {max} characters"));
    }
    Ok(ColumnValue::Text(value))
}

fn optional_text(value: Option<String>) -> ColumnValue {
    ColumnValue::OptText(trimmed(value))
}

/// Accepts absolute http(s) URLs and site-relative paths such as `/uploads/x.png`.
fn optional_url(value: Option<String>, field: &str) -> Result<ColumnValue, String> {
    let Some(value) = trimmed(value) else {
        return Ok(ColumnValue::OptText(None));
    };
    if value.starts_with('/') && !value.starts_with("//") {
        return Ok(ColumnValue::OptText(Some(value)));
    }
    match url::Url::parse(&value) {
        Ok(u) if matches!(u.scheme(), "http" | "https") => Ok(ColumnValue::OptText(Some(value))),
        _ => Err(format!("{field} must be an http(s) URL or a site path")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_slugs() {
        for collection in Collection::ALL {
            assert_eq!(Collection::from_slug(collection.slug()), Some(collection));
        }
        assert_eq!(
            Collection::from_slug("how-it-works"),
            Some(Collection::HowItWorks)
        );
        assert_eq!(Collection::from_slug("users"), None);
    }

    #[test]
    fn test_content_input_flattens_fields() {
        let input: ContentInput<FaqItemFields> = serde_json::from_str(
            r#"{"question":"How long?","answer":"About a week.","order":3,"isActive":false}"#,
        )
        .unwrap();
        assert_eq!(input.order, Some(3));
        assert_eq!(input.is_active, Some(false));
        assert_eq!(input.fields.question.as_deref(), Some("How long?"));
    }

    #[test]
    fn test_content_input_defaults_are_absent() {
        let input: ContentInput<ServiceItemFields> =
            serde_json::from_str(r#"{"title":"Live musicians"}"#).unwrap();
        assert!(input.order.is_none());
        assert!(input.is_active.is_none());
    }

    #[test]
    fn test_required_fields_reject_blank() {
        let err = FaqItem::columns(FaqItemFields {
            question: Some("   ".to_string()),
            answer: Some("Yes".to_string()),
        })
        .unwrap_err();
        assert_eq!(err, "question is required");

        let err = ServiceItem::columns(ServiceItemFields::default()).unwrap_err();
        assert_eq!(err, "title is required");
    }

    #[test]
    fn test_pricing_plan_columns() {
        let columns = PricingPlan::columns(PricingPlanFields {
            name: Some("Premium".to_string()),
            price: Some(Decimal::new(49_900, 2)),
            description: None,
            features: vec!["Live organist".to_string(), "  ".to_string()],
            is_popular: true,
        })
        .unwrap();

        assert_eq!(columns.len(), 5);
        assert!(columns.contains(&(
            "features",
            ColumnValue::TextList(vec!["Live organist".to_string()])
        )));
        assert!(columns.contains(&("is_popular", ColumnValue::Bool(true))));
    }

    #[test]
    fn test_pricing_plan_requires_non_negative_price() {
        let missing = PricingPlan::columns(PricingPlanFields {
            name: Some("Basic".to_string()),
            ..PricingPlanFields::default()
        });
        assert_eq!(missing.unwrap_err(), "price is required");

        let negative = PricingPlan::columns(PricingPlanFields {
            name: Some("Basic".to_string()),
            price: Some(Decimal::new(-1, 0)),
            ..PricingPlanFields::default()
        });
        assert!(negative.is_err());
    }

    #[test]
    fn test_pricing_plan_price_must_fit_column() {
        let too_large = PricingPlan::columns(PricingPlanFields {
            name: Some("Basic".to_string()),
            price: Some(Decimal::new(12_345_678_901_250, 2)),
            ..PricingPlanFields::default()
        });
        assert!(too_large.unwrap_err().starts_with("price must be at most"));

        let too_precise = PricingPlan::columns(PricingPlanFields {
            name: Some("Basic".to_string()),
            price: Some(Decimal::new(149_999, 3)),
            ..PricingPlanFields::default()
        });
        assert!(too_precise.is_err());
    }

    #[test]
    fn test_section_key_must_be_slug() {
        let bad = ContentSection::columns(ContentSectionFields {
            section_key: Some("Hero Banner".to_string()),
            title: Some("Welcome".to_string()),
            ..ContentSectionFields::default()
        });
        assert!(bad.is_err());

        let good = ContentSection::columns(ContentSectionFields {
            section_key: Some("hero".to_string()),
            title: Some("Welcome".to_string()),
            image_url: Some("/uploads/abc.jpg".to_string()),
            ..ContentSectionFields::default()
        });
        assert!(good.is_ok());
    }

    #[test]
    fn test_demo_video_urls() {
        let ok = DemoVideo::columns(DemoVideoFields {
            title: Some("Sample".to_string()),
            video_url: Some("https://videos.test/sample.mp4".to_string()),
            ..DemoVideoFields::default()
        })
        .unwrap();
        assert!(ok.contains(&(
            "video_url",
            ColumnValue::Text("https://videos.test/sample.mp4".to_string())
        )));

        let missing = DemoVideo::columns(DemoVideoFields {
            title: Some("Sample".to_string()),
            ..DemoVideoFields::default()
        });
        assert_eq!(missing.unwrap_err(), "videoUrl is required");

        let bad_scheme = DemoVideo::columns(DemoVideoFields {
            title: Some("Sample".to_string()),
            video_url: Some("javascript:alert(1)".to_string()),
            ..DemoVideoFields::default()
        });
        assert!(bad_scheme.is_err());
    }

    #[test]
    fn test_entities_serialize_order_and_is_active() {
        let item = FaqItem {
            id: Uuid::nil(),
            question: "Q".to_string(),
            answer: "A".to_string(),
            display_order: 2,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["order"], 2);
        assert_eq!(value["isActive"], true);
        assert!(value.get("displayOrder").is_none());
    }
}
