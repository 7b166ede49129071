//! Ordered blog categories.
//!
//! Every committed `order_index` is positive and unique. Reordering goes
//! through [`reorder`], which parks rows in the negative range before giving
//! them their final positions.

use std::collections::{HashMap, HashSet};

use blog_common::ordering::{FIRST_ORDER_INDEX, RenumberStep, ReorderPlan, phases, plan_reorder};
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::entity::{blog_category, blog_post};

#[derive(Debug, thiserror::Error)]
pub enum ReorderError {
    #[error("category_ids must not be empty")]
    Empty,
    #[error("Duplicate category {0} in reorder list")]
    Duplicate(i32),
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Result of a reorder request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReorderOutcome {
    /// The new order was written.
    Reordered,
    /// The submission already matched the stored order.
    Unchanged,
    /// The submission named a different set of categories; nothing was written.
    Stale,
}

/// All categories in display order.
pub async fn list_ordered<C: ConnectionTrait>(db: &C) -> Result<Vec<blog_category::Model>, DbErr> {
    blog_category::Entity::find()
        .order_by_asc(blog_category::Column::OrderIndex)
        .all(db)
        .await
}

/// Number of posts per category id. Categories without posts are absent.
pub async fn post_counts<C: ConnectionTrait>(db: &C) -> Result<HashMap<i32, i64>, DbErr> {
    let rows = blog_post::Entity::find()
        .select_only()
        .column(blog_post::Column::CategoryId)
        .column_as(blog_post::Column::Id.count(), "post_count")
        .group_by(blog_post::Column::CategoryId)
        .into_tuple::<(i32, i64)>()
        .all(db)
        .await?;
    Ok(rows.into_iter().collect())
}

/// Insert a category at the end of the order.
pub async fn create<C: TransactionTrait>(
    db: &C,
    slug: String,
    name: String,
) -> Result<blog_category::Model, DbErr> {
    let txn = db.begin().await?;

    let last = blog_category::Entity::find()
        .select_only()
        .column_as(blog_category::Column::OrderIndex.max(), "max_order_index")
        .into_tuple::<Option<i32>>()
        .one(&txn)
        .await?
        .flatten();
    let order_index = last.map_or(FIRST_ORDER_INDEX, |i| std::cmp::max(i + 1, FIRST_ORDER_INDEX));

    let now = chrono::Utc::now();
    let category = blog_category::ActiveModel {
        slug: Set(slug),
        name: Set(name),
        order_index: Set(order_index),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(category)
}

/// Re-sequence all categories to match `submitted`.
///
/// The current rows are locked for the length of the transaction, so concurrent
/// reorders run one after another and each compares against committed state.
/// A submission naming a different set of categories changes nothing and
/// returns [`ReorderOutcome::Stale`] with the authoritative order.
pub async fn reorder<C: TransactionTrait>(
    db: &C,
    submitted: &[i32],
) -> Result<(ReorderOutcome, Vec<blog_category::Model>), ReorderError> {
    validate_submission(submitted)?;

    let txn = db.begin().await?;
    let current = blog_category::Entity::find()
        .order_by_asc(blog_category::Column::OrderIndex)
        .lock(LockType::Update)
        .all(&txn)
        .await?;
    let current_ids: Vec<i32> = current.iter().map(|c| c.id).collect();

    let (outcome, categories) = match plan_reorder(&current_ids, submitted) {
        ReorderPlan::Stale => {
            warn!(
                current = current_ids.len(),
                submitted = submitted.len(),
                "Rejected stale category reorder"
            );
            (ReorderOutcome::Stale, current)
        }
        ReorderPlan::Unchanged => (ReorderOutcome::Unchanged, current),
        ReorderPlan::Apply(steps) => {
            let (temporary, committed) = phases(&steps);
            apply_steps(&txn, temporary).await?;
            debug!(count = temporary.len(), "Moved categories to temporary positions");
            apply_steps(&txn, committed).await?;

            let categories = list_ordered(&txn).await?;
            info!(count = categories.len(), "Reordered categories");
            (ReorderOutcome::Reordered, categories)
        }
    };

    txn.commit().await?;
    Ok((outcome, categories))
}

fn validate_submission(submitted: &[i32]) -> Result<(), ReorderError> {
    if submitted.is_empty() {
        return Err(ReorderError::Empty);
    }
    let mut seen = HashSet::new();
    for &id in submitted {
        if !seen.insert(id) {
            return Err(ReorderError::Duplicate(id));
        }
    }
    Ok(())
}

/// One statement per row, executed in order.
async fn apply_steps<C: ConnectionTrait>(txn: &C, steps: &[RenumberStep<i32>]) -> Result<(), DbErr> {
    let now = chrono::Utc::now();
    for step in steps {
        blog_category::Entity::update_many()
            .col_expr(blog_category::Column::OrderIndex, Expr::value(step.order_index))
            .col_expr(blog_category::Column::UpdatedAt, Expr::value(now))
            .filter(blog_category::Column::Id.eq(step.id))
            .exec(txn)
            .await?;
    }
    Ok(())
}
