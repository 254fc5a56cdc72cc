//! Resource catalog — every admin-managed table and its field set.
//!
//! DESIGN
//! ======
//! One generic list/detail implementation serves every resource; what
//! differs per resource (table, fields, display and ordering columns,
//! storage bucket) is declared here as static data.

#[cfg(test)]
#[path = "resource_test.rs"]
mod tests;

/// Input kind of a field; drives parsing, validation, and rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    TextArea,
    Integer,
    Decimal,
    Boolean,
    /// Calendar date as `YYYY-MM-DD`.
    Date,
    Select(&'static [&'static str]),
    /// Storage path of an uploaded image.
    Image,
}

impl FieldKind {
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Decimal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub read_only: bool,
    /// Set on create, locked afterwards.
    pub create_only: bool,
    /// Numeric fields only: reject values below zero.
    pub non_negative: bool,
}

impl FieldSpec {
    #[must_use]
    pub const fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self { name, label, kind, required: false, read_only: false, create_only: false, non_negative: false }
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    #[must_use]
    pub const fn create_only(mut self) -> Self {
        self.create_only = true;
        self
    }

    #[must_use]
    pub const fn non_negative(mut self) -> Self {
        self.non_negative = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resource {
    /// Route segment, e.g. `venue-categories`.
    pub slug: &'static str,
    pub table: &'static str,
    pub title: &'static str,
    /// Field searched by the list view's filter box.
    pub display_field: &'static str,
    /// Default list ordering column.
    pub order_key: &'static str,
    pub fields: &'static [FieldSpec],
    /// Storage bucket for `Image` fields.
    pub bucket: Option<&'static str>,
    /// False for tables written only by dedicated flows (the ledger);
    /// generic create, edit, and delete are refused.
    pub writable: bool,
}

impl Resource {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields a draft may carry (everything not read-only).
    pub fn editable_fields(&self) -> impl Iterator<Item = &'static FieldSpec> {
        self.fields.iter().filter(|f| !f.read_only)
    }

    /// Fields an update may patch: editable and not locked after create.
    pub fn updatable_fields(&self) -> impl Iterator<Item = &'static FieldSpec> {
        self.editable_fields().filter(|f| !f.create_only)
    }
}

// =============================================================================
// CATALOG
// =============================================================================

const CREATED_AT: FieldSpec = FieldSpec::new("created_at", "Created", FieldKind::Text).read_only();

pub const TIERS: Resource = Resource {
    slug: "tiers",
    table: "tiers",
    title: "Tiers",
    display_field: "name",
    order_key: "min_spend",
    fields: &[
        FieldSpec::new("name", "Name", FieldKind::Text).required(),
        FieldSpec::new("min_spend", "Minimum spend", FieldKind::Decimal)
            .required()
            .non_negative(),
        FieldSpec::new("perks", "Perks", FieldKind::TextArea),
        FieldSpec::new("badge", "Badge", FieldKind::Image),
        CREATED_AT,
    ],
    bucket: Some("tier-badges"),
    writable: true,
};

pub const PACKAGES: Resource = Resource {
    slug: "packages",
    table: "packages",
    title: "Packages",
    display_field: "title",
    order_key: "created_at",
    fields: &[
        FieldSpec::new("title", "Title", FieldKind::Text).required(),
        FieldSpec::new("price", "Price", FieldKind::Decimal)
            .required()
            .non_negative(),
        FieldSpec::new("description", "Description", FieldKind::TextArea),
        FieldSpec::new("tier_id", "Tier", FieldKind::Integer).non_negative(),
        FieldSpec::new("active", "Active", FieldKind::Boolean),
        CREATED_AT,
    ],
    bucket: None,
    writable: true,
};

pub const NOTIFICATIONS: Resource = Resource {
    slug: "notifications",
    table: "notifications",
    title: "Notifications",
    display_field: "title",
    order_key: "created_at",
    fields: &[
        FieldSpec::new("title", "Title", FieldKind::Text).required(),
        FieldSpec::new("message", "Message", FieldKind::TextArea).required(),
        FieldSpec::new("audience", "Audience", FieldKind::Select(&["all", "members", "vip"])),
        FieldSpec::new("scheduled_at", "Scheduled for", FieldKind::Date),
        CREATED_AT,
    ],
    bucket: None,
    writable: true,
};

pub const TESTIMONIALS: Resource = Resource {
    slug: "testimonials",
    table: "testimonials",
    title: "Testimonials",
    display_field: "author",
    order_key: "created_at",
    fields: &[
        FieldSpec::new("author", "Author", FieldKind::Text).required(),
        FieldSpec::new("content", "Content", FieldKind::TextArea).required(),
        FieldSpec::new("rating", "Rating", FieldKind::Integer).non_negative(),
        FieldSpec::new("profile_picture", "Profile picture", FieldKind::Image),
        CREATED_AT,
    ],
    bucket: Some("profile-pictures"),
    writable: true,
};

pub const VENUE_CATEGORIES: Resource = Resource {
    slug: "venue-categories",
    table: "venue_categories",
    title: "Venue categories",
    display_field: "name",
    order_key: "name",
    fields: &[
        FieldSpec::new("name", "Name", FieldKind::Text).required(),
        FieldSpec::new("description", "Description", FieldKind::TextArea),
        FieldSpec::new("icon", "Icon", FieldKind::Image),
    ],
    bucket: Some("category-icons"),
    writable: true,
};

pub const QUESTION_BANKS: Resource = Resource {
    slug: "question-banks",
    table: "question_banks",
    title: "Question bank",
    display_field: "question",
    order_key: "id",
    fields: &[
        FieldSpec::new("question", "Question", FieldKind::TextArea).required(),
        FieldSpec::new("category_id", "Category", FieldKind::Integer)
            .required()
            .non_negative(),
        FieldSpec::new("answer_type", "Answer type", FieldKind::Select(&["single", "multiple", "text"])),
        CREATED_AT,
    ],
    bucket: None,
    writable: true,
};

pub const DRINK_DOLLARS: Resource = Resource {
    slug: "drink-dollars",
    table: "drink_dollars",
    title: "Drink dollars",
    display_field: "user_id",
    order_key: "user_id",
    fields: &[
        FieldSpec::new("user_id", "User", FieldKind::Text)
            .required()
            .create_only(),
        FieldSpec::new("balance", "Balance", FieldKind::Integer)
            .read_only()
            .non_negative(),
        CREATED_AT,
    ],
    bucket: None,
    writable: true,
};

pub const DRINK_DOLLAR_TRANSACTIONS: Resource = Resource {
    slug: "drink-dollar-transactions",
    table: "drink_dollar_transactions",
    title: "Drink dollar transactions",
    display_field: "user_id",
    order_key: "created_at",
    fields: &[
        FieldSpec::new("user_id", "User", FieldKind::Text).read_only(),
        FieldSpec::new("action", "Action", FieldKind::Select(&["credit", "debit"])).read_only(),
        FieldSpec::new("coins", "Coins", FieldKind::Integer).read_only(),
        FieldSpec::new("balance_after", "Balance after", FieldKind::Integer).read_only(),
        FieldSpec::new("note", "Note", FieldKind::Text).read_only(),
        CREATED_AT,
    ],
    bucket: None,
    writable: false,
};

pub const EXPIRY_DATES: Resource = Resource {
    slug: "expiry-dates",
    table: "expiry_dates",
    title: "Expiry dates",
    display_field: "label",
    order_key: "days",
    fields: &[
        FieldSpec::new("label", "Label", FieldKind::Text).required(),
        FieldSpec::new("days", "Days", FieldKind::Integer)
            .required()
            .non_negative(),
    ],
    bucket: None,
    writable: true,
};

static CATALOG: [Resource; 9] = [
    TIERS,
    PACKAGES,
    NOTIFICATIONS,
    TESTIMONIALS,
    VENUE_CATEGORIES,
    QUESTION_BANKS,
    DRINK_DOLLARS,
    DRINK_DOLLAR_TRANSACTIONS,
    EXPIRY_DATES,
];

/// All admin-managed resources.
#[must_use]
pub fn catalog() -> &'static [Resource] {
    &CATALOG
}

/// Look up a resource by its route slug.
#[must_use]
pub fn find(slug: &str) -> Option<&'static Resource> {
    CATALOG.iter().find(|r| r.slug == slug)
}
