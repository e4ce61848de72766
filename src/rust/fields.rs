//! The input field table.
//!
//! Training one-hot encoded every text field as `FIELD` + `_` + `value` and
//! kept numeric fields under their own name. This table is the serving-side
//! record of that convention. Changing a field name, a kind, or the
//! separator changes which schema columns can be explained, so any such
//! change must bump [`ENCODING_VERSION`].

/// Bumped whenever the field table or the naming rule changes.
pub const ENCODING_VERSION: u8 = 1;

/// Separator between field name and value in one-hot column names.
pub const ONE_HOT_SEPARATOR: char = '_';

/// How a field is answered and encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text, one-hot encoded.
    Text,
    /// One of a fixed list of options, one-hot encoded.
    Choice(&'static [&'static str]),
    /// Whole number placed directly in the column named after the field.
    Integer { min: i32, max: i32 },
}

impl FieldKind {
    pub fn is_categorical(&self) -> bool {
        !matches!(self, FieldKind::Integer { .. })
    }
}

/// One row of the field table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Column prefix used at training time
    pub name: &'static str,
    /// Label shown to people filling in the form
    pub label: &'static str,
    pub kind: FieldKind,
}

pub const CITY: &str = "CITY";
pub const COUNTY: &str = "COUNTY";
pub const COMMUNITY: &str = "COMMUNITY";
pub const VEG_CLEARANCE: &str = "VEGCLERANCE";
pub const STRUCTURE_TYPE: &str = "STRUCTURET_STANDARDIZED";
pub const ROOF_CONSTRUCTION: &str = "ROOFCONSTRUCTR";
pub const EAVES: &str = "EAVES";
pub const VENT_SCREEN: &str = "VENTSCREEN";
pub const EXTERIOR_SURFACE: &str = "EXTERIORSI";
pub const WINDOW_PANE: &str = "WINDOWPANE";
pub const TOPOGRAPHY: &str = "TOPOGRAPHY";
pub const YEAR_BUILT: &str = "YEARBUILT";

pub const YEAR_BUILT_MIN: i32 = 1800;
pub const YEAR_BUILT_MAX: i32 = 2025;

/// Every input field, in form order.
pub const FIELDS: &[FieldSpec] = &[
    FieldSpec { name: CITY, label: "City", kind: FieldKind::Text },
    FieldSpec { name: COUNTY, label: "County", kind: FieldKind::Text },
    FieldSpec { name: COMMUNITY, label: "Community", kind: FieldKind::Text },
    FieldSpec {
        name: VEG_CLEARANCE,
        label: "Vegetation Clearance (distance in feet)",
        kind: FieldKind::Choice(&["0-30'", "30-60'", "60-100'", ">100'", "Unknown"]),
    },
    FieldSpec {
        name: STRUCTURE_TYPE,
        label: "Structure Type",
        kind: FieldKind::Choice(&[
            "Single Family Residence",
            "Mobile Home",
            "Non-habitable",
            "Outbuilding",
            "Commercial Building",
            "Multi Family Residence",
            "Public Building",
            "Mixed Use",
            "Other",
        ]),
    },
    FieldSpec {
        name: ROOF_CONSTRUCTION,
        label: "Roof Construction Type",
        kind: FieldKind::Choice(&[
            "Asphalt",
            "Fire Resistant",
            "Metal",
            "Unknown",
            "Tile",
            "Combustible",
            "Wood",
            "Concrete",
            "Other",
        ]),
    },
    FieldSpec {
        name: EAVES,
        label: "Eaves Type",
        kind: FieldKind::Choice(&[
            "Unknown",
            "Unenclosed",
            "Enclosed",
            "No Eaves",
            "Not Applicable",
        ]),
    },
    FieldSpec {
        name: VENT_SCREEN,
        label: "Vent Screen Type",
        kind: FieldKind::Choice(&[
            "Yes",
            "No",
            "Mesh Screen <= 1/8",
            "No Vents",
            "Unscreened",
            "Mesh Screen > 1/8",
            "Unknown",
        ]),
    },
    FieldSpec {
        name: EXTERIOR_SURFACE,
        label: "Exterior Surface Type",
        kind: FieldKind::Choice(&[
            "Combustible",
            "Ignition Resistant",
            "Fire Resistant",
            "Unknown",
        ]),
    },
    FieldSpec {
        name: WINDOW_PANE,
        label: "Window Pane Type",
        kind: FieldKind::Choice(&["Single Pane", "No Windows", "Multi Pane", "Unknown"]),
    },
    FieldSpec {
        name: TOPOGRAPHY,
        label: "Topography",
        kind: FieldKind::Choice(&[
            "Flat Ground",
            "Slope",
            "Ridge Top",
            "Saddle",
            "Chimney",
            "Unknown",
        ]),
    },
    FieldSpec {
        name: YEAR_BUILT,
        label: "Year Built",
        kind: FieldKind::Integer { min: YEAR_BUILT_MIN, max: YEAR_BUILT_MAX },
    },
];

/// Looks up a field by its training-time name.
pub fn field(name: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|f| f.name == name)
}

/// Builds the one-hot column name for a categorical answer.
pub fn one_hot_column(field: &str, value: &str) -> String {
    let mut column = String::with_capacity(field.len() + value.len() + 1);
    column.push_str(field);
    column.push(ONE_HOT_SEPARATOR);
    column.push_str(value);
    column
}

/// Names the field a schema column belongs to, if the table can explain it.
///
/// Numeric fields own the column spelled exactly like the field. Categorical
/// fields own every column starting with `FIELD_`. Field names may themselves
/// contain the separator (`STRUCTURET_STANDARDIZED`), so the longest matching
/// prefix wins.
pub fn owning_field(column: &str) -> Option<&'static FieldSpec> {
    FIELDS
        .iter()
        .filter(|f| {
            if f.kind.is_categorical() {
                column
                    .strip_prefix(f.name)
                    .is_some_and(|rest| rest.starts_with(ONE_HOT_SEPARATOR))
            } else {
                column == f.name
            }
        })
        .max_by_key(|f| f.name.len())
}
