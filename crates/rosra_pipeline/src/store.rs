//! CategoryStore: one generic reducer over a stream's ordered categories.
//!
//! Every operation is synchronous and total: an unknown id or field name is a
//! no-op reported as `Outcome::Ignored`, never an error. Order is preserved
//! except that `Add` appends and `Delete` removes in place.
//!
//! Ids are assigned as `<PREFIX>-<n>` from a counter that only moves forward,
//! so a deleted category's id is not handed out again by the same store
//! until the counter is exhausted.
//! Row expansion is UI state and is tracked in a separate set.

use std::collections::BTreeSet;

use rosra_core::entities::{
    Category, CategoryFields, LicenseFields, PropertyTaxFields, StreamKind, StreamSnapshot, Workbook,
};
use rosra_core::ids::CategoryId;
use rosra_core::numeric::coerce_input;
use rosra_core::seeds::user_charge_template;

/// Name given to categories added without one.
pub const DEFAULT_CATEGORY_NAME: &str = "New Category";

#[derive(Debug, Clone, PartialEq)]
pub enum StoreAction<F> {
    Add,
    AddNamed(String),
    /// Numeric update; the value is coerced (negative/non-finite → 0).
    Update { id: CategoryId, field: String, value: f64 },
    /// Update from user-typed text (digit grouping accepted, junk → 0).
    UpdateRaw { id: CategoryId, field: String, raw: String },
    Rename { id: CategoryId, name: String },
    Delete(CategoryId),
    Toggle(CategoryId),
    ReplaceAll(Vec<Category<F>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Added(CategoryId),
    Ignored,
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        !matches!(self, Outcome::Ignored)
    }
}

#[derive(Debug, Clone)]
pub struct CategoryStore<F> {
    kind: StreamKind,
    categories: Vec<Category<F>>,
    expanded: BTreeSet<CategoryId>,
    next_seq: u64,
    template: F,
}

impl<F: CategoryFields> CategoryStore<F> {
    /// Empty store; `template` is the field record given to new categories.
    pub fn new(kind: StreamKind, template: F) -> Self {
        Self { kind, categories: Vec::new(), expanded: BTreeSet::new(), next_seq: 1, template }
    }

    /// Store over existing categories; the counter resumes after the highest
    /// `<PREFIX>-<n>` suffix present.
    pub fn from_categories(kind: StreamKind, categories: Vec<Category<F>>, template: F) -> Self {
        let mut store = Self::new(kind, template);
        store.advance_past(&categories);
        store.categories = categories;
        store
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    pub fn categories(&self) -> &[Category<F>] {
        &self.categories
    }

    pub fn into_categories(self) -> Vec<Category<F>> {
        self.categories
    }

    pub fn get(&self, id: &CategoryId) -> Option<&Category<F>> {
        self.categories.iter().find(|c| &c.id == id)
    }

    pub fn is_expanded(&self, id: &CategoryId) -> bool {
        self.expanded.contains(id)
    }

    /// Sequence number the next `Add` will use.
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    pub fn apply(&mut self, action: StoreAction<F>) -> Outcome {
        match action {
            StoreAction::Add => self.add(DEFAULT_CATEGORY_NAME.to_string()),
            StoreAction::AddNamed(name) => self.add(name),
            StoreAction::Update { id, field, value } => {
                self.with_category(&id, |c| c.fields.set(&field, coerce_input(value)))
            }
            StoreAction::UpdateRaw { id, field, raw } => {
                self.with_category(&id, |c| c.fields.set_raw(&field, &raw))
            }
            StoreAction::Rename { id, name } => self.with_category(&id, |c| {
                c.name = name;
                true
            }),
            StoreAction::Delete(id) => self.delete(&id),
            StoreAction::Toggle(id) => self.toggle(&id),
            StoreAction::ReplaceAll(mut categories) => {
                for c in &mut categories {
                    c.fields.coerce_all();
                }
                self.advance_past(&categories);
                self.categories = categories;
                self.expanded.clear();
                Outcome::Applied
            }
        }
    }

    fn add(&mut self, name: String) -> Outcome {
        let Some(id) = self.fresh_id() else {
            return Outcome::Ignored;
        };
        self.categories.push(Category::new(id.clone(), name, self.template.clone()));
        Outcome::Added(id)
    }

    /// Next unused id from the counter. Externally supplied ids may already
    /// occupy a slot. Once the counter reaches `u64::MAX` the lowest free
    /// suffix is taken instead.
    fn fresh_id(&mut self) -> Option<CategoryId> {
        let mut seq = Some(self.next_seq);
        while let Some(n) = seq {
            let id = CategoryId::for_stream(self.kind, n);
            seq = n.checked_add(1);
            if self.get(&id).is_none() {
                self.next_seq = seq.unwrap_or(u64::MAX);
                return Some(id);
            }
        }
        (1..=u64::MAX)
            .map(|n| CategoryId::for_stream(self.kind, n))
            .find(|id| self.get(id).is_none())
    }

    fn delete(&mut self, id: &CategoryId) -> Outcome {
        let Some(pos) = self.categories.iter().position(|c| &c.id == id) else {
            return Outcome::Ignored;
        };
        self.categories.remove(pos);
        self.expanded.remove(id);
        Outcome::Applied
    }

    fn toggle(&mut self, id: &CategoryId) -> Outcome {
        if self.get(id).is_none() {
            return Outcome::Ignored;
        }
        if !self.expanded.remove(id) {
            self.expanded.insert(id.clone());
        }
        Outcome::Applied
    }

    fn with_category(&mut self, id: &CategoryId, f: impl FnOnce(&mut Category<F>) -> bool) -> Outcome {
        let Some(c) = self.categories.iter_mut().find(|c| &c.id == id) else {
            return Outcome::Ignored;
        };
        if f(c) { Outcome::Applied } else { Outcome::Ignored }
    }

    fn advance_past(&mut self, categories: &[Category<F>]) {
        let prefix = format!("{}-", self.kind.id_prefix());
        let max_seq = categories
            .iter()
            .filter_map(|c| c.id.as_str().strip_prefix(prefix.as_str()))
            .filter_map(|n| n.parse::<u64>().ok())
            .max();
        if let Some(n) = max_seq {
            self.next_seq = self.next_seq.max(n.saturating_add(1));
        }
    }
}

/* ------------------------------ Workbook editing ------------------------------ */

/// Edit addressed to one stream of a workbook. Unlike `StoreAction` it does
/// not depend on the stream's field type.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEdit {
    Add { name: Option<String> },
    UpdateRaw { id: CategoryId, field: String, raw: String },
    Rename { id: CategoryId, name: String },
    Delete(CategoryId),
}

impl StreamEdit {
    fn into_action<F>(self) -> StoreAction<F> {
        match self {
            StreamEdit::Add { name: None } => StoreAction::Add,
            StreamEdit::Add { name: Some(n) } => StoreAction::AddNamed(n),
            StreamEdit::UpdateRaw { id, field, raw } => StoreAction::UpdateRaw { id, field, raw },
            StreamEdit::Rename { id, name } => StoreAction::Rename { id, name },
            StreamEdit::Delete(id) => StoreAction::Delete(id),
        }
    }
}

fn edit_snapshot<F: CategoryFields, A>(
    kind: StreamKind,
    snapshot: &mut StreamSnapshot<F, A>,
    template: F,
    edit: StreamEdit,
) -> Outcome {
    let categories = std::mem::take(&mut snapshot.categories);
    let mut store = CategoryStore::from_categories(kind, categories, template);
    let outcome = store.apply(edit.into_action());
    snapshot.categories = store.into_categories();
    outcome
}

/// Apply one edit to the named stream of `wb`.
pub fn edit_workbook(wb: &mut Workbook, kind: StreamKind, edit: StreamEdit) -> Outcome {
    let outcome = match kind {
        StreamKind::PropertyTax => {
            edit_snapshot(kind, &mut wb.property_tax, PropertyTaxFields::default(), edit)
        }
        StreamKind::License => edit_snapshot(kind, &mut wb.license, LicenseFields::default(), edit),
        StreamKind::ShortTermUserCharge => {
            edit_snapshot(kind, &mut wb.short_term, user_charge_template(kind), edit)
        }
        StreamKind::LongTermUserCharge => {
            edit_snapshot(kind, &mut wb.long_term, user_charge_template(kind), edit)
        }
        StreamKind::MixedUserCharge => edit_snapshot(kind, &mut wb.mixed, user_charge_template(kind), edit),
    };
    tracing::debug!(stream = kind.code(), ?outcome, "store edit");
    outcome
}
