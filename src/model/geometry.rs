//! Geometric layout types: regions and the Page → Zone → Part hierarchy.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// A rectangular region in layout coordinates.
///
/// The y axis grows downward from the top edge of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    /// Left edge
    pub x_start: u32,
    /// Right edge
    pub x_end: u32,
    /// Top edge
    pub y_start: u32,
    /// Bottom edge
    pub y_end: u32,
}

impl Region {
    /// Create a region, rejecting empty or inverted bounds.
    pub fn new(x_start: u32, x_end: u32, y_start: u32, y_end: u32) -> Result<Self, String> {
        if x_end <= x_start {
            return Err(format!("x_end ({}) must be greater than x_start ({})", x_end, x_start));
        }
        if y_end <= y_start {
            return Err(format!("y_end ({}) must be greater than y_start ({})", y_end, y_start));
        }
        Ok(Self {
            x_start,
            x_end,
            y_start,
            y_end,
        })
    }

    /// Width of the region.
    pub fn width(&self) -> u32 {
        self.x_end - self.x_start
    }

    /// Height of the region.
    pub fn height(&self) -> u32 {
        self.y_end - self.y_start
    }

    /// Check if `other` lies entirely inside this region.
    pub fn contains(&self, other: &Region) -> bool {
        other.x_start >= self.x_start
            && other.x_end <= self.x_end
            && other.y_start >= self.y_start
            && other.y_end <= self.y_end
    }

    /// Number of whole slots of `slot_height` that fit vertically (at least 1).
    pub fn slot_capacity(&self, slot_height: u32) -> usize {
        let slot_height = slot_height.max(1);
        ((self.height() / slot_height) as usize).max(1)
    }

    /// The `index`-th horizontal slot of `slot_height`, counted from the top edge.
    pub fn slot(&self, index: usize, slot_height: u32) -> Region {
        let slot_height = slot_height.max(1);
        let y_start = self.y_start.saturating_add(index as u32 * slot_height);
        Region {
            x_start: self.x_start,
            x_end: self.x_end,
            y_start,
            y_end: y_start.saturating_add(slot_height),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{})-({},{})",
            self.x_start, self.y_start, self.x_end, self.y_end
        )
    }
}

/// Page dimensions parsed from a `WIDTHxHEIGHT` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSize {
    /// Page width
    pub width: u32,
    /// Page height
    pub height: u32,
}

impl PageSize {
    /// Parse a `WIDTHxHEIGHT` size string (separator `x` or `X`).
    pub fn parse(s: &str) -> Option<Self> {
        let caps = size_regex().captures(s.trim())?;
        let width: u32 = caps[1].parse().ok()?;
        let height: u32 = caps[2].parse().ok()?;
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self { width, height })
    }

    /// The full page as a region.
    pub fn bounds(&self) -> Region {
        Region {
            x_start: 0,
            x_end: self.width,
            y_start: 0,
            y_end: self.height,
        }
    }

    /// Check if the page is in landscape orientation.
    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }
}

fn size_regex() -> &'static Regex {
    static SIZE: OnceLock<Regex> = OnceLock::new();
    SIZE.get_or_init(|| Regex::new(r"^(\d+)\s*[xX]\s*(\d+)$").expect("page size pattern is valid"))
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// The finest-grained named region; content is placed at Part granularity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    /// Part name, matched against the part component of a content address
    pub name: String,
    /// Part bounds
    pub region: Region,
}

/// A named region of a page, optionally subdivided into parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Zone name, matched against the zone component of a content address
    pub name: String,
    /// Zone bounds
    pub region: Region,
    /// Parts in declared order (may be empty)
    pub parts: Vec<Part>,
}

impl Zone {
    /// Find a part by name.
    pub fn part(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.name == name)
    }
}

/// A page-level image placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Image name (a file name or resource key for the renderer)
    pub name: String,
    /// Image bounds
    pub region: Region,
}

/// One page definition of the layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page number as declared in the layout
    pub number: u16,

    /// Page size
    pub size: PageSize,

    /// Raw condition text, if the page is conditional
    pub condition_source: Option<String>,

    /// Parsed condition
    #[serde(skip)]
    pub condition: Option<super::Condition>,

    /// Whether fanned-out rows may continue onto synthesized pages
    pub overflow: bool,

    /// Optional page image
    pub image: Option<Image>,

    /// Zones in declared order
    pub zones: Vec<Zone>,
}

impl Page {
    /// Create an unconditional page with no zones.
    pub fn new(number: u16, size: PageSize) -> Self {
        Self {
            number,
            size,
            condition_source: None,
            condition: None,
            overflow: false,
            image: None,
            zones: Vec::new(),
        }
    }

    /// The page number as it appears in content addresses.
    pub fn key(&self) -> String {
        self.number.to_string()
    }

    /// Find a zone by name.
    pub fn zone(&self, name: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.name == name)
    }

    /// Total number of parts across all zones.
    pub fn part_count(&self) -> usize {
        self.zones.iter().map(|z| z.parts.len()).sum()
    }
}

/// Position of a part inside a [`Layout`], as indices into the page/zone/part vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartIndex {
    /// Index into `Layout::pages`
    pub page: usize,
    /// Index into `Page::zones`
    pub zone: usize,
    /// Index into `Zone::parts`
    pub part: usize,
}

/// The loaded page layout: an arena of pages that own their zones and parts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Pages in ascending page-number order
    pub pages: Vec<Page>,
}

impl Layout {
    /// Create a layout, ordering pages by page number.
    pub fn new(mut pages: Vec<Page>) -> Self {
        pages.sort_by_key(|p| p.number);
        Self { pages }
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Total number of zones.
    pub fn zone_count(&self) -> usize {
        self.pages.iter().map(|p| p.zones.len()).sum()
    }

    /// Total number of parts.
    pub fn part_count(&self) -> usize {
        self.pages.iter().map(|p| p.part_count()).sum()
    }

    /// Find a page by its address key.
    pub fn page(&self, key: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.key() == key)
    }

    /// Resolve a `(page, zone, part)` address to arena indices.
    ///
    /// Keys are compared verbatim; `"01"` does not match page `1`.
    pub fn locate(&self, page_key: &str, zone_key: &str, part_key: &str) -> Option<PartIndex> {
        let page = self.pages.iter().position(|p| p.key() == page_key)?;
        let zones = &self.pages[page].zones;
        let zone = zones.iter().position(|z| z.name == zone_key)?;
        let part = zones[zone].parts.iter().position(|p| p.name == part_key)?;
        Some(PartIndex { page, zone, part })
    }

    /// Get a part by arena indices.
    pub fn part_at(&self, index: PartIndex) -> Option<&Part> {
        self.pages
            .get(index.page)?
            .zones
            .get(index.zone)?
            .parts
            .get(index.part)
    }
}
