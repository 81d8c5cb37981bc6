//! Dry run of a dispatch for conversational front ends.
//!
//! Free-text item descriptions are matched to PO items with Jaro-Winkler
//! similarity, then the matched quantities go through the same capacity
//! builder and [`check_capacity`] the real DC write uses. Nothing is written.

use crate::{
    db::DbPool,
    entities::{
        purchase_order::Entity as PurchaseOrder,
        purchase_order_item::{self, Entity as PurchaseOrderItem},
    },
    errors::{ServiceError, ViolationKind},
    services::{
        delivery_challans::DispatchLine,
        validation::{build_capacity_checks, check_capacity, ResolvedLine},
    },
};
use rust_decimal::Decimal;
use sea_orm::{entity::prelude::*, ConnectionTrait, QueryOrder};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc};
use strsim::jaro_winkler;
use tracing::{debug, instrument};

/// Minimum similarity for a description to count as a match.
pub const MATCH_THRESHOLD: f64 = 0.82;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftLine {
    pub description: String,
    pub quantity: Decimal,
    #[serde(default)]
    pub lot_no: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreflightLine {
    pub description: String,
    pub requested: Decimal,
    pub lot_no: Option<i32>,
    pub matched_po_item_no: Option<i32>,
    pub matched_description: Option<String>,
    pub similarity: f64,
    /// Remaining before this draft, for the matched item.
    pub remaining: Option<Decimal>,
    pub ok: bool,
    pub violation: Option<ViolationKind>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchPreview {
    pub po_number: i64,
    pub lines: Vec<PreflightLine>,
    /// True when the real create would accept these lines as matched.
    pub ready: bool,
}

pub fn normalize(input: &str) -> String {
    input
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Best scoring PO item for a free-text description, if any clears
/// [`MATCH_THRESHOLD`]. Both the description and the material code are tried.
pub fn best_match<'a>(
    text: &str,
    items: &'a [purchase_order_item::Model],
) -> Option<(&'a purchase_order_item::Model, f64)> {
    let needle = normalize(text);
    if needle.is_empty() {
        return None;
    }

    items
        .iter()
        .filter_map(|item| {
            let score = [item.description.as_deref(), item.material_code.as_deref()]
                .into_iter()
                .flatten()
                .map(|candidate| jaro_winkler(&needle, &normalize(candidate)))
                .fold(0.0_f64, f64::max);
            (score >= MATCH_THRESHOLD).then_some((item, score))
        })
        .max_by(|a, b| a.1.total_cmp(&b.1))
}

pub struct PreflightService {
    db_pool: Arc<DbPool>,
}

impl PreflightService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, drafts), fields(lines = drafts.len()))]
    pub async fn preview_dispatch(
        &self,
        po_number: i64,
        drafts: Vec<DraftLine>,
    ) -> Result<DispatchPreview, ServiceError> {
        preview_dispatch(self.db_pool.as_ref(), po_number, drafts).await
    }
}

pub async fn preview_dispatch<C: ConnectionTrait>(
    conn: &C,
    po_number: i64,
    drafts: Vec<DraftLine>,
) -> Result<DispatchPreview, ServiceError> {
    PurchaseOrder::find_by_id(po_number)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("PO {} not found", po_number)))?;
    let items = PurchaseOrderItem::find()
        .filter(purchase_order_item::Column::PoNumber.eq(po_number))
        .order_by_asc(purchase_order_item::Column::PoItemNo)
        .all(conn)
        .await?;

    let mut lines = Vec::with_capacity(drafts.len());
    // Matched draft indexes grouped by PO item, so quantities aggregate the
    // same way a single DC request does.
    let mut groups: BTreeMap<i32, Vec<(usize, ResolvedLine)>> = BTreeMap::new();

    for (index, draft) in drafts.into_iter().enumerate() {
        let matched = best_match(&draft.description, &items);
        let mut line = PreflightLine {
            description: draft.description.clone(),
            requested: draft.quantity,
            lot_no: draft.lot_no,
            matched_po_item_no: matched.map(|(item, _)| item.po_item_no),
            matched_description: matched.and_then(|(item, _)| item.description.clone()),
            similarity: matched.map_or(0.0, |(_, score)| score),
            remaining: None,
            ok: false,
            violation: None,
            message: None,
        };

        match matched {
            None => line.message = Some("No PO item matches this description".to_string()),
            Some(_) if draft.quantity <= Decimal::ZERO => {
                line.message = Some("Quantity must be positive".to_string())
            }
            Some((item, score)) => {
                debug!(po_item_no = item.po_item_no, score, "draft line matched");
                groups.entry(item.po_item_no).or_default().push((
                    index,
                    ResolvedLine {
                        item: item.clone(),
                        line: DispatchLine {
                            po_item_no: item.po_item_no,
                            lot_no: draft.lot_no,
                            description: Some(draft.description),
                            dispatch_quantity: draft.quantity,
                        },
                    },
                ));
            }
        }
        lines.push(line);
    }

    for entries in groups.into_values() {
        let indexes: Vec<usize> = entries.iter().map(|(i, _)| *i).collect();
        let resolved: Vec<ResolvedLine> = entries.into_iter().map(|(_, r)| r).collect();

        let verdict = match build_capacity_checks(conn, &resolved, None).await {
            Ok(checks) => checks
                .first()
                .map(|check| (Some(check.remaining()), check_capacity(check))),
            Err(err @ ServiceError::NotFound(_)) => Some((None, Err(err))),
            Err(err) => return Err(err),
        };

        if let Some((remaining, outcome)) = verdict {
            for i in indexes {
                let line = &mut lines[i];
                line.remaining = remaining;
                match &outcome {
                    Ok(()) => line.ok = true,
                    Err(err) => {
                        line.violation = err.kind();
                        line.message = Some(err.response_message());
                    }
                }
            }
        }
    }

    let ready = !lines.is_empty() && lines.iter().all(|l| l.ok);
    Ok(DispatchPreview {
        po_number,
        lines,
        ready,
    })
}
