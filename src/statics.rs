// Central place for UI strings and other non-localized constants.
// Keep these out of gui.rs to reduce duplication and make tweaks safer.

// English UI strings (EN_ prefix to make future localization easier)
pub const EN_APP_TITLE: &str = "Asset Grid";

pub const EN_REGION_ASSETS: &str = "Assets";
pub const EN_REGION_STATS: &str = "Stats";

pub const EN_LABEL_PATH: &str = "Path";
pub const EN_BTN_BROWSE: &str = "Browse";
pub const EN_BTN_REFRESH: &str = "Refresh";
pub const EN_HINT_REFRESH: &str = "Reload schema, modules and types";
pub const EN_DIALOG_PICK_FOLDER: &str = "Select Asset Folder";
pub const EN_DIALOG_CREATE_PREFIX: &str = "Create New";
pub const EN_MODULES_ALL: &str = "All Modules";

pub const EN_LABEL_TYPE: &str = "Type";
pub const EN_LABEL_INCLUDE_DERIVED: &str = "Include Derived";
pub const EN_LABEL_SEARCH_TYPES: &str = "Search Types";
pub const EN_LABEL_SEARCH_INSTANCES: &str = "Search Instances";
pub const EN_LABEL_AMOUNT: &str = "Amount";
pub const EN_BTN_ADD: &str = "+";
pub const EN_HINT_ADD: &str = "Create new assets of the selected type";
pub const EN_NO_TYPES: &str = "No asset types found under this path.";
pub const EN_NO_RECORDS: &str = "No assets match.";

pub const EN_STAT_COUNT: &str = "Count:";
pub const EN_STAT_TOTAL_MEMORY: &str = "Total Memory:";
pub const EN_STAT_FILTERED_MEMORY: &str = "Filtered Memory:";

pub const EN_COL_DUPLICATE: &str = "Actions";
pub const EN_COL_DELETE: &str = "Delete";
pub const EN_COL_NAME: &str = "Instance Name";

pub const EN_BTN_DUPLICATE_ROW: &str = "+";
pub const EN_HINT_DUPLICATE_ROW: &str = "Duplicate this asset";
pub const EN_BTN_DELETE_ROW: &str = "🗑";
pub const EN_HINT_DELETE_ROW: &str = "Delete this asset";
pub const EN_REF_NONE: &str = "None";

// Small glyphs used in tables/headers.
pub const EN_GLYPH_SORT_ASC: &str = " ▲";
pub const EN_GLYPH_SORT_DESC: &str = " ▼";

pub const EN_STATUS_DUPLICATED: &str = "Duplicated";
pub const EN_STATUS_DELETED: &str = "Deleted";
pub const EN_STATUS_CREATED: &str = "Created";
pub const EN_STATUS_REFRESHED: &str = "Refreshed";
pub const EN_ERR_PREFIX: &str = "Error:";
pub const EN_ERR_OUTSIDE_PROJECT: &str = "is outside the project folder";
pub const EN_BTN_CLEAR: &str = "Clear";
pub const EN_BADGE_UNSAVED: &str = "unsaved";

// Project layout.
pub const SCHEMA_FILE_NAME: &str = "schema.json5";
pub const ASSET_EXTENSION: &str = "asset";
pub const ASSET_TYPE_KEY: &str = "$type";
pub const DEFAULT_MODULE: &str = "Main";

// Preference keys.
pub const PREFS_APP_DIR: &str = "asset-grid";
pub const PREFS_FILE_NAME: &str = "prefs.json";
pub const PREFS_COLUMN_WIDTHS_PREFIX: &str = "asset_grid.column_widths.";

// Grid geometry.
pub const COL_WIDTH_DUPLICATE: f32 = 35.0;
pub const COL_WIDTH_DELETE: f32 = 35.0;
pub const COL_WIDTH_NAME: f32 = 150.0;
pub const COL_WIDTH_FIELD_MIN: f32 = 100.0;
pub const COL_WIDTH_PER_LABEL_CHAR: f32 = 10.0;
pub const COL_WIDTH_FLOOR: f32 = 20.0;
pub const RESIZE_HANDLE_HALF_WIDTH: f32 = 4.0;
pub const TEXT_AREA_LINE_HEIGHT: f32 = 14.0;

// Fixed leading pseudo-columns.
pub const COLUMN_NAME: usize = 2;
pub const FIRST_FIELD_COLUMN: usize = 3;

pub const CREATE_COUNT_MAX: u32 = 1000;
