//! Well-known department names
//!
//! Departments are free text in the database (process steps may name any
//! department); these are the ones the shop floor ships with.

pub const PREPRESS: &str = "Prepress";
pub const CTP: &str = "CTP";
pub const CUTTING: &str = "Cutting";
pub const OFFSET_PRINTING: &str = "Offset Printing";
pub const DIGITAL_PRINTING: &str = "Digital Printing";
pub const LAMINATION: &str = "Lamination";
pub const DIE_CUTTING: &str = "Die Cutting";
pub const PASTING: &str = "Pasting";
pub const FINISHING: &str = "Finishing";
pub const DISPATCH: &str = "Dispatch";

pub const ALL_DEPARTMENTS: &[&str] = &[
    PREPRESS,
    CTP,
    CUTTING,
    OFFSET_PRINTING,
    DIGITAL_PRINTING,
    LAMINATION,
    DIE_CUTTING,
    PASTING,
    FINISHING,
    DISPATCH,
];

/// Case-insensitive department comparison ("prepress" == "Prepress")
pub fn same_department(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

pub fn is_prepress(department: &str) -> bool {
    same_department(department, PREPRESS)
}
