//! Treatment and product queries.
//!
//! Both catalogs list active entries alphabetically, and a lookup by id also
//! returns the most recent budget lines that quote the entry.

use super::pagination::{Page, PageRequest};
use super::patient::ACTIVE_REGISTRATION_STATE;
use crate::{
    entities::{Budget, BudgetDetail, Product, Treatment, budget, budget_detail, product, treatment},
    errors::Result,
};
use sea_orm::{PaginatorTrait, QueryOrder, QuerySelect, prelude::*};

/// How many referencing budget lines a lookup returns
pub const RECENT_LINES_LIMIT: u64 = 10;

/// A budget line that quotes a catalog entry, with its budget
#[derive(Debug, Clone, PartialEq)]
pub struct QuotedLine {
    /// The quoting line
    pub line: budget_detail::Model,
    /// Budget the line belongs to
    pub budget: Option<budget::Model>,
}

/// A catalog entry with the budget lines that quote it, newest budget first
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry<M> {
    /// The treatment or product
    pub entry: M,
    /// Most recent lines quoting it
    pub quoted_on: Vec<QuotedLine>,
}

async fn recent_lines(
    db: &DatabaseConnection,
    reference: budget_detail::Column,
    id: i64,
) -> Result<Vec<QuotedLine>> {
    let lines = BudgetDetail::find()
        .find_also_related(Budget)
        .filter(reference.eq(id))
        .order_by_desc(budget::Column::Date)
        .limit(RECENT_LINES_LIMIT)
        .all(db)
        .await?;
    Ok(lines
        .into_iter()
        .map(|(line, budget)| QuotedLine { line, budget })
        .collect())
}

/// Lists active treatments by name, searching name and description.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_treatments(
    db: &DatabaseConnection,
    request: &PageRequest,
) -> Result<Page<treatment::Model>> {
    let mut query = Treatment::find()
        .filter(treatment::Column::RegistrationStateId.eq(ACTIVE_REGISTRATION_STATE));
    if let Some(condition) =
        request.search_condition(&[treatment::Column::Name, treatment::Column::Description])
    {
        query = query.filter(condition);
    }

    let paginator = query
        .order_by_asc(treatment::Column::Name)
        .paginate(db, request.limit);
    Ok(Page {
        total: paginator.num_items().await?,
        items: paginator.fetch_page(request.page_index()).await?,
        page: request.page,
        limit: request.limit,
    })
}

/// Retrieves a treatment and the latest budget lines quoting it.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_treatment(
    db: &DatabaseConnection,
    treatment_id: i64,
) -> Result<Option<CatalogEntry<treatment::Model>>> {
    let Some(entry) = Treatment::find_by_id(treatment_id).one(db).await? else {
        return Ok(None);
    };
    let quoted_on = recent_lines(db, budget_detail::Column::TreatmentId, entry.id).await?;
    Ok(Some(CatalogEntry { entry, quoted_on }))
}

/// Lists active products by name, searching name and description.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_products(
    db: &DatabaseConnection,
    request: &PageRequest,
) -> Result<Page<product::Model>> {
    let mut query =
        Product::find().filter(product::Column::RegistrationStateId.eq(ACTIVE_REGISTRATION_STATE));
    if let Some(condition) =
        request.search_condition(&[product::Column::Name, product::Column::Description])
    {
        query = query.filter(condition);
    }

    let paginator = query
        .order_by_asc(product::Column::Name)
        .paginate(db, request.limit);
    Ok(Page {
        total: paginator.num_items().await?,
        items: paginator.fetch_page(request.page_index()).await?,
        page: request.page,
        limit: request.limit,
    })
}

/// Retrieves a product and the latest budget lines selling it.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_product(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<Option<CatalogEntry<product::Model>>> {
    let Some(entry) = Product::find_by_id(product_id).one(db).await? else {
        return Ok(None);
    };
    let quoted_on = recent_lines(db, budget_detail::Column::ProductId, entry.id).await?;
    Ok(Some(CatalogEntry { entry, quoted_on }))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{
        create_test_budget, create_test_line, create_test_patient, create_test_product,
        create_test_treatment, setup_test_db,
    };

    #[tokio::test]
    async fn test_list_treatments_alphabetically() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_treatment(&db, "Whitening").await?;
        create_test_treatment(&db, "Cleaning").await?;
        create_test_treatment(&db, "Root canal").await?;

        let page = list_treatments(&db, &PageRequest::default()).await?;
        let names: Vec<_> = page.items.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Cleaning", "Root canal", "Whitening"]);

        let searched = list_treatments(&db, &PageRequest::default().with_search("canal")).await?;
        assert_eq!(searched.total, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_treatment_with_quoted_lines() -> Result<()> {
        let db = setup_test_db().await?;
        let ana = create_test_patient(&db, "10", "Ana").await?;
        let older = create_test_budget(&db, ana.id, "1", 2022).await?;
        let newer = create_test_budget(&db, ana.id, "2", 2024).await?;
        let cleaning = create_test_treatment(&db, "Cleaning").await?;
        create_test_line(&db, older.id, 1, Some(cleaning.id)).await?;
        create_test_line(&db, newer.id, 1, Some(cleaning.id)).await?;
        create_test_line(&db, newer.id, 2, None).await?;

        let entry = get_treatment(&db, cleaning.id).await?.unwrap();
        assert_eq!(entry.entry.name, "Cleaning");
        assert_eq!(entry.quoted_on.len(), 2);
        assert_eq!(entry.quoted_on[0].budget.as_ref().map(|b| b.id), Some(newer.id));

        assert!(get_treatment(&db, 999).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_products_list_and_lookup() -> Result<()> {
        let db = setup_test_db().await?;
        let floss = create_test_product(&db, "Floss").await?;
        create_test_product(&db, "Brush").await?;

        let page = list_products(&db, &PageRequest::new(1, 1)).await?;
        assert_eq!(page.total, 2);
        assert_eq!(page.total_pages(), 2);
        assert_eq!(page.items[0].name, "Brush");

        let entry = get_product(&db, floss.id).await?.unwrap();
        assert!(entry.quoted_on.is_empty());
        Ok(())
    }
}
