//! Retained page model.
//!
//! The dashboard never draws directly. The controller mutates a `Page` keyed
//! by the same element ids the HTML page used, and the frontend renders
//! whatever the page currently says. Every mutation bumps `revision`, so a
//! caller can tell whether an operation touched the page at all.

use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementId {
    Temp,
    Hum,
    StatusDot,
    TableContainer,
    DataTableBody,
    DataControls,
    GraphContainer,
    DataChart,
    ShowGraph,
    HideData,
}

impl ElementId {
    pub const ALL: [ElementId; 10] = [
        ElementId::Temp,
        ElementId::Hum,
        ElementId::StatusDot,
        ElementId::TableContainer,
        ElementId::DataTableBody,
        ElementId::DataControls,
        ElementId::GraphContainer,
        ElementId::DataChart,
        ElementId::ShowGraph,
        ElementId::HideData,
    ];

    pub fn dom_id(self) -> &'static str {
        match self {
            ElementId::Temp => "temp",
            ElementId::Hum => "hum",
            ElementId::StatusDot => "status-dot",
            ElementId::TableContainer => "table-container",
            ElementId::DataTableBody => "data-table-body",
            ElementId::DataControls => "data-controls",
            ElementId::GraphContainer => "graph-container",
            ElementId::DataChart => "data-chart",
            ElementId::ShowGraph => "show-graph",
            ElementId::HideData => "hide-data",
        }
    }
}

/// CSS `display` values the dashboard uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    None,
    Block,
    Flex,
}

#[derive(Debug, Clone)]
pub struct Element {
    pub text: String,
    pub display: Display,
    classes: BTreeSet<String>,
}

impl Element {
    fn new(text: &str, display: Display) -> Self {
        Self {
            text: text.to_string(),
            display,
            classes: BTreeSet::new(),
        }
    }
}

/// One `<tr>` of the history table, already formatted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub datetime: String,
    pub temperature: String,
    pub humidity: String,
}

/// Pixel size of a box, used both for the canvas backing store and for the
/// graph container's client area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct Page {
    elements: HashMap<ElementId, Element>,
    table_rows: Vec<TableRow>,
    canvas: Size,
    graph_container: Size,
    revision: u64,
}

pub const SHOW_GRAPH_LABEL: &str = "Pokaż wykres";
pub const SHOW_TABLE_LABEL: &str = "Pokaż tabelę";
pub const HIDE_DATA_LABEL: &str = "Ukryj dane";

impl Page {
    /// The page as the markup ships it: live values pending, history hidden.
    pub fn new() -> Self {
        let mut elements = HashMap::new();
        for id in ElementId::ALL {
            let element = match id {
                ElementId::Temp | ElementId::Hum => Element::new(crate::reading::PLACEHOLDER, Display::Block),
                ElementId::TableContainer | ElementId::GraphContainer | ElementId::DataControls => {
                    Element::new("", Display::None)
                }
                ElementId::ShowGraph => Element::new(SHOW_GRAPH_LABEL, Display::Block),
                ElementId::HideData => Element::new(HIDE_DATA_LABEL, Display::Block),
                _ => Element::new("", Display::Block),
            };
            elements.insert(id, element);
        }

        Self {
            elements,
            table_rows: Vec::new(),
            canvas: Size::default(),
            graph_container: Size::default(),
            revision: 0,
        }
    }

    fn element(&self, id: ElementId) -> &Element {
        // Every id is inserted in `new` and never removed
        &self.elements[&id]
    }

    fn element_mut(&mut self, id: ElementId) -> &mut Element {
        self.revision += 1;
        self.elements
            .entry(id)
            .or_insert_with(|| Element::new("", Display::Block))
    }

    pub fn text(&self, id: ElementId) -> &str {
        &self.element(id).text
    }

    pub fn set_text(&mut self, id: ElementId, text: impl Into<String>) {
        self.element_mut(id).text = text.into();
    }

    pub fn display(&self, id: ElementId) -> Display {
        self.element(id).display
    }

    pub fn is_shown(&self, id: ElementId) -> bool {
        self.display(id) != Display::None
    }

    pub fn set_display(&mut self, id: ElementId, display: Display) {
        self.element_mut(id).display = display;
    }

    pub fn has_class(&self, id: ElementId, class: &str) -> bool {
        self.element(id).classes.contains(class)
    }

    pub fn add_class(&mut self, id: ElementId, class: &str) {
        self.element_mut(id).classes.insert(class.to_string());
    }

    pub fn remove_class(&mut self, id: ElementId, class: &str) {
        self.element_mut(id).classes.remove(class);
    }

    /// Rows currently in `data-table-body`.
    pub fn table_rows(&self) -> &[TableRow] {
        &self.table_rows
    }

    /// Clears `data-table-body` and appends `rows` in order.
    pub fn replace_table_rows(&mut self, rows: Vec<TableRow>) {
        self.revision += 1;
        self.table_rows = rows;
    }

    /// Backing-store size of the `data-chart` canvas.
    pub fn canvas(&self) -> Size {
        self.canvas
    }

    pub fn resize_canvas(&mut self, size: Size) {
        self.revision += 1;
        self.canvas = size;
    }

    /// Client size of `graph-container`. Reading layout is not a mutation.
    pub fn graph_container(&self) -> Size {
        self.graph_container
    }

    /// Records the layout the frontend gave `graph-container`. Layout comes
    /// from the frontend, so this does not count as a page mutation.
    pub fn set_graph_container(&mut self, size: Size) {
        self.graph_container = size;
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}
