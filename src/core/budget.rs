//! Budget queries - Read access to migrated budgets and their lines.

use super::pagination::{Page, PageRequest};
use super::patient::ACTIVE_REGISTRATION_STATE;
use crate::{
    entities::{Budget, BudgetDetail, Patient, budget, budget_detail, patient},
    errors::Result,
};
use sea_orm::{Condition, PaginatorTrait, QueryOrder, prelude::*};

/// A budget row as shown in lists, with the patient it was issued to
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetSummary {
    /// The budget record
    pub budget: budget::Model,
    /// Patient it was issued to
    pub patient: Option<patient::Model>,
}

/// Counts over the lines of one budget
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineStats {
    /// All lines
    pub total: usize,
    /// Lines linked to a treatment
    pub treatments: usize,
    /// Lines linked to a product
    pub products: usize,
}

impl LineStats {
    /// Tallies the links of `lines`.
    #[must_use]
    pub fn of(lines: &[budget_detail::Model]) -> Self {
        Self {
            total: lines.len(),
            treatments: lines.iter().filter(|line| line.treatment_id.is_some()).count(),
            products: lines.iter().filter(|line| line.product_id.is_some()).count(),
        }
    }
}

/// A budget with its patient and lines ordered by line number
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetDetails {
    /// The budget record
    pub budget: budget::Model,
    /// Patient it was issued to
    pub patient: Option<patient::Model>,
    /// Lines in line-number order
    pub lines: Vec<budget_detail::Model>,
    /// Link counts over `lines`
    pub stats: LineStats,
}

/// Lists active budgets, newest date first.
///
/// The search text matches the patient's name or surname, or the budget's
/// legacy id; a numeric search also matches the budget id. `status` keeps
/// only budgets in that status.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_budgets(
    db: &DatabaseConnection,
    request: &PageRequest,
    status: Option<i64>,
) -> Result<Page<BudgetSummary>> {
    let mut query = Budget::find()
        .find_also_related(Patient)
        .filter(budget::Column::RegistrationStateId.eq(ACTIVE_REGISTRATION_STATE));

    if let Some(search) = request.search.as_deref() {
        let mut condition = Condition::any()
            .add(patient::Column::Name.contains(search))
            .add(patient::Column::Surname.contains(search))
            .add(budget::Column::OldId.contains(search));
        if let Ok(id) = search.parse::<i64>() {
            condition = condition.add(budget::Column::Id.eq(id));
        }
        query = query.filter(condition);
    }
    if let Some(status) = status {
        query = query.filter(budget::Column::StatusId.eq(status));
    }

    let paginator = query
        .order_by_desc(budget::Column::Date)
        .paginate(db, request.limit);
    let total = paginator.num_items().await?;
    let items = paginator
        .fetch_page(request.page_index())
        .await?
        .into_iter()
        .map(|(budget, patient)| BudgetSummary { budget, patient })
        .collect();

    Ok(Page {
        items,
        total,
        page: request.page,
        limit: request.limit,
    })
}

/// Retrieves a budget with its lines, or `None` if no such budget exists.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_budget(db: &DatabaseConnection, budget_id: i64) -> Result<Option<BudgetDetails>> {
    let Some((budget, patient)) = Budget::find_by_id(budget_id)
        .find_also_related(Patient)
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    let lines = BudgetDetail::find()
        .filter(budget_detail::Column::BudgetId.eq(budget.id))
        .order_by_asc(budget_detail::Column::LineNumber)
        .all(db)
        .await?;
    let stats = LineStats::of(&lines);

    Ok(Some(BudgetDetails {
        budget,
        patient,
        lines,
        stats,
    }))
}
