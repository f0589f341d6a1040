//! Seed a demo business from YAML.
//!
//! The file is validated in full before anything touches the database, using
//! the same forms the dashboard API accepts:
//!
//! ```yaml
//! owner: 6f1c2d3e-0000-4000-8000-000000000001
//! business:
//!   name: Night Owl Co
//! storefronts:
//!   - name: Night Owl
//!     slug: night-owl
//!     published: true
//!     verification: { verification_type: both, password: moonlight }
//!     instructions: { enabled: true, text: Pickup only }
//!     products:
//!       - name: Midnight Mints
//!         description: Dark chocolate mints
//!         in_town_price: "12.00"
//!         shipping_price: "15.00"
//!         categories: [Edibles]
//! ```

use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;

use storecraft_core::UserId;
use storecraft_server::db::{
    BusinessRepository, ProductRepository, StorefrontRepository, storefronts::StoredPassword,
};
use storecraft_server::forms::{
    BusinessForm, BusinessInput, InstructionsForm, PasswordChange, ProductForm, StorefrontForm,
    StorefrontInput, ThemeForm, VerificationForm, VerificationInput,
};
use storecraft_server::models::{Instructions, NewProduct, ThemeConfig};
use storecraft_server::services::gate;

use super::{CommandError, connect};

/// A demo seed file.
#[derive(Debug, Deserialize)]
pub struct DemoSeed {
    /// Auth user that owns the business.
    pub owner: UserId,
    pub business: BusinessForm,
    #[serde(default)]
    pub storefronts: Vec<DemoStorefront>,
}

#[derive(Debug, Deserialize)]
pub struct DemoStorefront {
    #[serde(flatten)]
    pub details: StorefrontForm,
    #[serde(default)]
    pub published: bool,
    pub verification: Option<VerificationForm>,
    pub instructions: Option<InstructionsForm>,
    pub theme: Option<ThemeForm>,
    #[serde(default)]
    pub products: Vec<ProductForm>,
}

/// A seed file after validation.
#[derive(Debug)]
pub struct SeedPlan {
    pub owner: UserId,
    pub business: BusinessInput,
    pub storefronts: Vec<PlannedStorefront>,
}

#[derive(Debug)]
pub struct PlannedStorefront {
    pub details: StorefrontInput,
    pub published: bool,
    pub verification: Option<VerificationInput>,
    pub instructions: Option<Instructions>,
    pub theme: Option<ThemeConfig>,
    pub products: Vec<NewProduct>,
}

impl DemoSeed {
    /// Validate every form in the file.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Invalid` naming the first invalid entry.
    pub fn plan(self) -> Result<SeedPlan, CommandError> {
        let business = self
            .business
            .validate()
            .map_err(|e| CommandError::invalid("business", e))?;

        let storefronts = self
            .storefronts
            .into_iter()
            .map(DemoStorefront::plan)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SeedPlan {
            owner: self.owner,
            business,
            storefronts,
        })
    }
}

impl DemoStorefront {
    fn plan(self) -> Result<PlannedStorefront, CommandError> {
        let details = self
            .details
            .validate()
            .map_err(|e| CommandError::invalid("storefront", e))?;
        let slug = details.slug.clone();

        let verification = self
            .verification
            .map(|form| form.validate(false))
            .transpose()
            .map_err(|e| CommandError::invalid(format!("verification of {slug}"), e))?;
        let instructions = self
            .instructions
            .map(InstructionsForm::validate)
            .transpose()
            .map_err(|e| CommandError::invalid(format!("instructions of {slug}"), e))?;
        let theme = self
            .theme
            .map(ThemeForm::validate)
            .transpose()
            .map_err(|e| CommandError::invalid(format!("theme of {slug}"), e))?;

        let products = self
            .products
            .into_iter()
            .enumerate()
            .map(|(i, form)| {
                form.validate()
                    .map_err(|e| CommandError::invalid(format!("product {} of {slug}", i + 1), e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PlannedStorefront {
            details,
            published: self.published,
            verification,
            instructions,
            theme,
            products,
        })
    }
}

/// Load a demo business from `file`.
///
/// # Errors
///
/// Returns an error if the file is unreadable or invalid, or a database
/// write fails. Storefronts created before a failure are kept.
pub async fn demo(file: &Path) -> Result<(), CommandError> {
    info!(path = %file.display(), "Loading demo seed");
    let content = tokio::fs::read_to_string(file).await?;
    let plan = serde_yaml::from_str::<DemoSeed>(&content)?.plan()?;
    info!(
        storefronts = plan.storefronts.len(),
        "Seed file validated successfully"
    );

    let pool = connect().await?;
    let business = BusinessRepository::new(&pool)
        .create_with_owner(&plan.business, plan.owner)
        .await?;
    info!(business_id = %business.id, name = %business.name, "Created business");

    for storefront in &plan.storefronts {
        seed_storefront(&pool, business.id, storefront).await?;
    }

    info!("Seeding complete!");
    Ok(())
}

async fn seed_storefront(
    pool: &PgPool,
    business_id: storecraft_core::BusinessId,
    planned: &PlannedStorefront,
) -> Result<(), CommandError> {
    let repo = StorefrontRepository::new(pool);
    let storefront = repo.create(business_id, &planned.details).await?;
    let id = storefront.id;

    if let Some(verification) = &planned.verification {
        let password = match &verification.password {
            PasswordChange::Keep => StoredPassword::Keep,
            PasswordChange::Clear => StoredPassword::Clear,
            PasswordChange::Set(secret) => {
                let hash = gate::hash_password(secret.expose_secret())
                    .map_err(|e| CommandError::Other(format!("password hashing failed: {e}")))?;
                StoredPassword::Set(SecretString::from(hash))
            }
        };
        repo.update_verification(id, verification, &password).await?;
    }
    if let Some(instructions) = &planned.instructions {
        repo.update_instructions(id, instructions).await?;
    }
    if let Some(theme) = &planned.theme {
        repo.update_theme(id, theme).await?;
    }

    let products = ProductRepository::new(pool)
        .create_many(id, &planned.products)
        .await?;

    if planned.published {
        repo.set_published(id, true).await?;
    }

    info!(
        slug = %storefront.slug,
        products = products.len(),
        published = planned.published,
        "Seeded storefront"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use storecraft_core::VerificationType;

    use super::*;

    const SEED: &str = r#"
owner: 6f1c2d3e-0000-4000-8000-000000000001
business:
  name: Night Owl Co
storefronts:
  - name: Night Owl
    slug: night-owl
    published: true
    verification:
      verification_type: both
      password: moonlight
    instructions:
      enabled: true
      text: Pickup only
    products:
      - name: Midnight Mints
        description: Dark chocolate mints
        in_town_price: "12.00"
        shipping_price: "15.00"
        categories: [Edibles]
      - name: Owl Tee
        description: Cotton tee
        in_town_price: "20"
        shipping_price: "24"
        categories: Apparel, Merch
  - name: Second Shop
"#;

    #[test]
    fn test_seed_file_plans() {
        let plan = serde_yaml::from_str::<DemoSeed>(SEED).unwrap().plan().unwrap();
        assert_eq!(plan.business.name, "Night Owl Co");
        assert_eq!(plan.storefronts.len(), 2);

        let first = &plan.storefronts[0];
        assert_eq!(first.details.slug.as_str(), "night-owl");
        assert!(first.published);
        assert_eq!(
            first.verification.as_ref().unwrap().verification_type,
            VerificationType::Both
        );
        assert!(matches!(
            first.verification.as_ref().unwrap().password,
            PasswordChange::Set(_)
        ));
        assert_eq!(first.products.len(), 2);
        assert_eq!(first.products[1].categories.joined(), "Apparel,Merch");

        let second = &plan.storefronts[1];
        assert_eq!(second.details.slug.as_str(), "second-shop");
        assert!(!second.published);
        assert!(second.products.is_empty());
    }

    #[test]
    fn test_invalid_product_names_its_position() {
        let seed = SEED.replace(r#"in_town_price: "20""#, r#"in_town_price: "twenty""#);
        let err = serde_yaml::from_str::<DemoSeed>(&seed)
            .unwrap()
            .plan()
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("product 2 of night-owl"), "{message}");
        assert!(message.contains("in_town_price"), "{message}");
    }
}
