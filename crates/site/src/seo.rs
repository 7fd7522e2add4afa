//! SEO metadata for rendered pages.
//!
//! [`SiteSeo`] holds the site-wide defaults. Each page describes itself with
//! a [`PageMeta`], and [`SiteSeo::resolve`] merges the two into the
//! [`SeoTags`] the base template writes into `<head>`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;
use url::Url;

/// Title template applied by [`SiteSeo::format_title`].
const TITLE_TEMPLATE: &str = "%s | Lekas";

/// Brand colour used by browser chrome.
pub const THEME_COLOR: &str = "#6122A3";

// =============================================================================
// Site defaults
// =============================================================================

/// Links to the company's social profiles.
#[derive(Debug, Clone)]
pub struct SocialLinks {
    pub twitter: String,
    pub facebook: String,
    pub linkedin: String,
    pub instagram: String,
}

#[derive(Debug, Clone)]
pub struct PostalAddress {
    pub street: String,
    pub locality: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
}

/// Organization details for structured data.
#[derive(Debug, Clone)]
pub struct Organization {
    pub name: String,
    pub legal_name: String,
    pub description: String,
    pub logo: String,
    pub telephone: String,
    pub email: String,
    pub address: PostalAddress,
}

/// Site-wide SEO defaults.
#[derive(Debug, Clone)]
pub struct SiteSeo {
    pub site_name: String,
    /// Public origin, without a trailing slash
    pub site_url: String,
    pub default_title: String,
    pub default_description: String,
    pub default_keywords: String,
    pub default_author: String,
    pub default_image: String,
    pub social: SocialLinks,
    pub organization: Organization,
}

impl SiteSeo {
    /// Lekas defaults, served from `site_url`.
    #[must_use]
    pub fn lekas(site_url: &Url) -> Self {
        Self {
            site_name: "Lekas".to_string(),
            site_url: site_url.as_str().trim_end_matches('/').to_string(),
            default_title: "Lekas - Professional Services".to_string(),
            default_description: "Lekas provides exceptional professional services to help \
                your business grow and succeed. Contact us today to learn more about our \
                comprehensive solutions."
                .to_string(),
            default_keywords:
                "lekas, professional services, business solutions, consulting, expertise"
                    .to_string(),
            default_author: "Lekas Team".to_string(),
            default_image: "/og-image.jpg".to_string(),
            social: SocialLinks {
                twitter: "@lekas".to_string(),
                facebook: "https://facebook.com/lekas".to_string(),
                linkedin: "https://linkedin.com/company/lekas".to_string(),
                instagram: "https://instagram.com/lekas".to_string(),
            },
            organization: Organization {
                name: "Lekas".to_string(),
                legal_name: "Lekas Professional Services".to_string(),
                description: "Professional services and business consulting company".to_string(),
                logo: "/logo.png".to_string(),
                telephone: "+1-XXX-XXX-XXXX".to_string(),
                email: "contact@lekas.com".to_string(),
                address: PostalAddress {
                    street: "123 Business St".to_string(),
                    locality: "City".to_string(),
                    region: "State".to_string(),
                    postal_code: "12345".to_string(),
                    country: "US".to_string(),
                },
            },
        }
    }

    /// Apply the `%s | Lekas` title template.
    #[must_use]
    pub fn format_title(&self, title: &str) -> String {
        TITLE_TEMPLATE.replace("%s", title)
    }

    /// Absolute URL for a site path. Values that are already absolute are
    /// kept as they are.
    #[must_use]
    pub fn absolute_url(&self, path: &str) -> String {
        if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}{path}", self.site_url)
        }
    }

    /// Merge `page` over the site defaults.
    #[must_use]
    pub fn resolve(&self, page: &PageMeta) -> SeoTags {
        let title = page.title.clone().unwrap_or_else(|| self.default_title.clone());
        let description = page
            .description
            .clone()
            .unwrap_or_else(|| self.default_description.clone());
        let author = page
            .author
            .clone()
            .unwrap_or_else(|| self.default_author.clone());
        let canonical = if page.path.is_empty() || page.path == "/" {
            self.site_url.clone()
        } else {
            self.absolute_url(&page.path)
        };

        let article = (page.og_type == OgType::Article).then(|| ArticleTags {
            published_time: page.published_time.map(rfc3339),
            modified_time: page.modified_time.map(rfc3339),
            author: author.clone(),
        });

        SeoTags {
            json_ld: self.organization_json_ld(&description),
            keywords: page
                .keywords
                .clone()
                .unwrap_or_else(|| self.default_keywords.clone()),
            robots: if page.no_index {
                "noindex, nofollow"
            } else {
                "index, follow"
            },
            image: self.absolute_url(page.image.as_deref().unwrap_or(&self.default_image)),
            og_type: page.og_type.as_str(),
            site_name: self.site_name.clone(),
            twitter_handle: self.social.twitter.clone(),
            theme_color: THEME_COLOR,
            title,
            description,
            author,
            canonical,
            article,
        }
    }

    /// Schema.org `Organization` block as a `<script>`-safe JSON string.
    fn organization_json_ld(&self, description: &str) -> String {
        let org = &self.organization;
        let value = json!({
            "@context": "https://schema.org",
            "@type": "Organization",
            "name": org.name,
            "legalName": org.legal_name,
            "url": self.site_url,
            "logo": self.absolute_url(&org.logo),
            "description": description,
            "email": org.email,
            "address": {
                "@type": "PostalAddress",
                "streetAddress": org.address.street,
                "addressLocality": org.address.locality,
                "addressRegion": org.address.region,
                "postalCode": org.address.postal_code,
                "addressCountry": org.address.country,
            },
            "contactPoint": {
                "@type": "ContactPoint",
                "telephone": org.telephone,
                "contactType": "customer service",
            },
            "sameAs": [
                self.social.facebook,
                format!("https://twitter.com/{}", self.social.twitter.trim_start_matches('@')),
                self.social.linkedin,
                self.social.instagram,
            ],
        });
        // Keep a `</script>` inside a string from ending the block.
        value.to_string().replace("</", "<\\/")
    }
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

// =============================================================================
// Per-page metadata
// =============================================================================

/// Open Graph object type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OgType {
    #[default]
    Website,
    Article,
    Profile,
}

impl OgType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Website => "website",
            Self::Article => "article",
            Self::Profile => "profile",
        }
    }
}

/// What a page says about itself. Unset fields fall back to the site
/// defaults.
#[derive(Debug, Clone, Default)]
pub struct PageMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    /// Request path, used for the canonical URL
    pub path: String,
    pub image: Option<String>,
    pub og_type: OgType,
    pub author: Option<String>,
    pub published_time: Option<DateTime<Utc>>,
    pub modified_time: Option<DateTime<Utc>>,
    pub no_index: bool,
}

impl PageMeta {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = Some(keywords.into());
        self
    }

    #[must_use]
    pub const fn og_type(mut self, og_type: OgType) -> Self {
        self.og_type = og_type;
        self
    }

    /// Ask crawlers not to index or follow the page.
    #[must_use]
    pub const fn no_index(mut self) -> Self {
        self.no_index = true;
        self
    }
}

// =============================================================================
// Resolved tags
// =============================================================================

/// `article:*` tags, present only for article pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleTags {
    pub published_time: Option<String>,
    pub modified_time: Option<String>,
    pub author: String,
}

/// Everything the `<head>` needs.
#[derive(Debug, Clone)]
pub struct SeoTags {
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub author: String,
    pub robots: &'static str,
    pub canonical: String,
    pub og_type: &'static str,
    pub image: String,
    pub site_name: String,
    pub twitter_handle: String,
    pub theme_color: &'static str,
    pub article: Option<ArticleTags>,
    pub json_ld: String,
}
