//! Child element order of `CT_Workbook` and `CT_Worksheet`.
//!
//! Retained elements are written back at their schema position, so the
//! reader records each one's index in these tables.

pub(crate) const WORKBOOK_ELEMENTS: [&str; 19] = [
    "fileVersion",
    "fileSharing",
    "workbookPr",
    "workbookProtection",
    "bookViews",
    "sheets",
    "functionGroups",
    "externalReferences",
    "definedNames",
    "calcPr",
    "oleSize",
    "customWorkbookViews",
    "pivotCaches",
    "smartTagPr",
    "smartTagTypes",
    "webPublishing",
    "fileRecoveryPr",
    "webPublishObjects",
    "extLst",
];

pub(crate) const WORKSHEET_ELEMENTS: [&str; 39] = [
    "sheetPr",
    "dimension",
    "sheetViews",
    "sheetFormatPr",
    "cols",
    "sheetData",
    "sheetCalcPr",
    "sheetProtection",
    "protectedRanges",
    "scenarios",
    "autoFilter",
    "sortState",
    "dataConsolidate",
    "customSheetViews",
    "mergeCells",
    "phoneticPr",
    "conditionalFormatting",
    "dataValidations",
    "hyperlinks",
    "printOptions",
    "pageMargins",
    "pageSetup",
    "headerFooter",
    "rowBreaks",
    "colBreaks",
    "customProperties",
    "cellWatches",
    "ignoredErrors",
    "smartTags",
    "drawing",
    "legacyDrawing",
    "legacyDrawingHF",
    "drawingHF",
    "picture",
    "oleObjects",
    "controls",
    "webPublishItems",
    "tableParts",
    "extLst",
];

/// Schema position of `name` in `table`.
pub(crate) fn element_order(table: &[&str], name: &[u8]) -> Option<u8> {
    table.iter().position(|el| el.as_bytes() == name).map(|i| i as u8)
}

/// Position of a known element name, `u8::MAX` when it is not listed.
pub(crate) fn order_of(table: &[&str], name: &str) -> u8 {
    element_order(table, name.as_bytes()).unwrap_or(u8::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orders() {
        assert_eq!(element_order(&WORKSHEET_ELEMENTS, b"sheetData"), Some(5));
        assert!(order_of(&WORKSHEET_ELEMENTS, "mergeCells") > order_of(&WORKSHEET_ELEMENTS, "sheetProtection"));
        assert!(order_of(&WORKSHEET_ELEMENTS, "pageMargins") < order_of(&WORKSHEET_ELEMENTS, "drawing"));
        assert_eq!(element_order(&WORKBOOK_ELEMENTS, b"definedNames"), Some(8));
        assert_eq!(element_order(&WORKBOOK_ELEMENTS, b"AlternateContent"), None);
    }
}
