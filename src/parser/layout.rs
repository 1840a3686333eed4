//! Page layout loader.
//!
//! The layout source is an XML tree:
//!
//! ```xml
//! <Pages>
//!   <Page Pagenumber="1">
//!     <Pagesize>612x792</Pagesize>
//!     <Condition>%%1_Country%% == 'US'</Condition>
//!     <Overflow>true</Overflow>
//!     <Image Imagename="logo.png" Xstart="20" XEnd="120" YStart="20" YEnd="80"/>
//!     <Zones>
//!       <Zone Zonename="A" Xstart="0" XEnd="612" YStart="100" YEnd="300">
//!         <Parts>
//!           <Part Partname="1" Xstart="20" XEnd="300" YStart="100" YEnd="200"/>
//!         </Parts>
//!       </Zone>
//!     </Zones>
//!   </Page>
//! </Pages>
//! ```
//!
//! Loading runs in two passes. The schema pass rejects documents that are
//! not well-formed or that use an element or attribute outside the layout
//! vocabulary ([`Error::LayoutSchema`]). The structure pass enforces
//! cardinality and value rules ([`Error::LayoutStructure`]).

use std::collections::HashSet;

use roxmltree::{Document, Node};

use super::options::LoadOptions;
use crate::error::{Error, Result};
use crate::model::{Condition, Image, Layout, Page, PageSize, Part, Region, Zone};

const BOUND_ATTRIBUTES: [&str; 4] = ["Xstart", "XEnd", "YStart", "YEnd"];

/// Allowed child elements and attributes for each element of the layout vocabulary.
struct ElementRule {
    name: &'static str,
    children: &'static [&'static str],
    attributes: &'static [&'static str],
}

const SCHEMA: &[ElementRule] = &[
    ElementRule {
        name: "Pages",
        children: &["Page"],
        attributes: &[],
    },
    ElementRule {
        name: "Page",
        children: &["Pagesize", "Condition", "Overflow", "Image", "Zones"],
        attributes: &["Pagenumber"],
    },
    ElementRule {
        name: "Pagesize",
        children: &[],
        attributes: &[],
    },
    ElementRule {
        name: "Condition",
        children: &[],
        attributes: &[],
    },
    ElementRule {
        name: "Overflow",
        children: &[],
        attributes: &[],
    },
    ElementRule {
        name: "Image",
        children: &[],
        attributes: &["Imagename", "Xstart", "XEnd", "YStart", "YEnd"],
    },
    ElementRule {
        name: "Zones",
        children: &["Zone"],
        attributes: &[],
    },
    ElementRule {
        name: "Zone",
        children: &["Parts"],
        attributes: &["Zonename", "Xstart", "XEnd", "YStart", "YEnd"],
    },
    ElementRule {
        name: "Parts",
        children: &["Part"],
        attributes: &[],
    },
    ElementRule {
        name: "Part",
        children: &[],
        attributes: &["Partname", "Xstart", "XEnd", "YStart", "YEnd"],
    },
];

fn rule_for(name: &str) -> Option<&'static ElementRule> {
    SCHEMA.iter().find(|r| r.name == name)
}

/// Parse a layout from XML text.
pub fn parse_layout(xml: &str, options: &LoadOptions) -> Result<Layout> {
    let doc = Document::parse(xml).map_err(|e| Error::LayoutSchema(e.to_string()))?;
    let root = doc.root_element();

    validate_schema(root)?;

    let page_nodes = element_children(root, "Page");
    if page_nodes.is_empty() {
        return Err(Error::LayoutStructure(
            "missing Page element; at least one is required".to_string(),
        ));
    }

    let mut pages = Vec::with_capacity(page_nodes.len());
    let mut numbers = HashSet::new();
    for (i, node) in page_nodes.iter().enumerate() {
        let page = parse_page(*node, i + 1, options)?;
        if !numbers.insert(page.number) {
            return Err(Error::LayoutStructure(format!(
                "duplicate Pagenumber {}",
                page.number
            )));
        }
        check_page_containment(&page, options)?;
        pages.push(page);
    }

    let layout = Layout::new(pages);
    check_page_sequence(&layout, options)?;

    log::debug!(
        "Loaded layout: {} pages, {} zones, {} parts",
        layout.page_count(),
        layout.zone_count(),
        layout.part_count()
    );
    Ok(layout)
}

/// Schema pass: vocabulary and nesting only.
fn validate_schema(root: Node) -> Result<()> {
    if root.tag_name().name() != "Pages" {
        return Err(Error::LayoutSchema(format!(
            "root element must be <Pages>, found <{}>",
            root.tag_name().name()
        )));
    }
    validate_element(root)
}

fn validate_element(node: Node) -> Result<()> {
    let name = node.tag_name().name();
    let rule = rule_for(name)
        .ok_or_else(|| Error::LayoutSchema(format!("unknown element <{}>", name)))?;

    for attr in node.attributes() {
        if attr.namespace().is_some() {
            continue;
        }
        if !rule.attributes.contains(&attr.name()) {
            return Err(Error::LayoutSchema(format!(
                "attribute '{}' is not allowed on <{}>",
                attr.name(),
                name
            )));
        }
    }

    for child in node.children() {
        if child.is_element() {
            let child_name = child.tag_name().name();
            if !rule.children.contains(&child_name) {
                return Err(Error::LayoutSchema(format!(
                    "element <{}> is not allowed inside <{}>",
                    child_name, name
                )));
            }
            validate_element(child)?;
        } else if child.is_text() && !rule.children.is_empty() {
            let text = child.text().unwrap_or_default();
            if !text.trim().is_empty() {
                return Err(Error::LayoutSchema(format!(
                    "unexpected text \"{}\" inside <{}>",
                    text.trim(),
                    name
                )));
            }
        }
    }
    Ok(())
}

fn parse_page(node: Node, position: usize, options: &LoadOptions) -> Result<Page> {
    let context = format!("Page element {}", position);

    if node.attributes().filter(|a| a.namespace().is_none()).count() != 1 {
        return Err(Error::LayoutStructure(format!(
            "{} must carry exactly one Pagenumber attribute",
            context
        )));
    }
    let number_text = node
        .attribute("Pagenumber")
        .ok_or_else(|| Error::LayoutStructure(format!("missing Pagenumber attribute for {}", context)))?;
    let number: u16 = number_text.trim().parse().map_err(|_| {
        Error::LayoutStructure(format!(
            "Pagenumber \"{}\" of {} is not a 16-bit unsigned integer",
            number_text, context
        ))
    })?;
    let context = format!("Page {}", number);

    let size_node = exactly_one(node, "Pagesize", &context)?;
    let size_text = size_node.text().unwrap_or_default().trim();
    let size = PageSize::parse(size_text).ok_or_else(|| {
        Error::LayoutStructure(format!(
            "Pagesize \"{}\" of {} must be WIDTHxHEIGHT",
            size_text, context
        ))
    })?;

    let mut page = Page::new(number, size);

    if let Some(cond_node) = at_most_one(node, "Condition", &context)? {
        let text = cond_node.text().unwrap_or_default().trim();
        if text.is_empty() {
            return Err(Error::LayoutStructure(format!(
                "empty Condition on {}",
                context
            )));
        }
        let condition = Condition::parse_with(
            text,
            &options.placeholder_marker,
            options.index_separator,
        )
        .map_err(|e| Error::LayoutStructure(format!("invalid Condition on {}: {}", context, e)))?;
        page.condition_source = Some(text.to_string());
        page.condition = Some(condition);
    }

    if let Some(over_node) = at_most_one(node, "Overflow", &context)? {
        let text = over_node.text().unwrap_or_default().trim();
        page.overflow = parse_bool(text).ok_or_else(|| {
            Error::LayoutStructure(format!(
                "Overflow \"{}\" of {} must be true or false",
                text, context
            ))
        })?;
    }

    if let Some(image_node) = at_most_one(node, "Image", &context)? {
        let (name, region) = named_region(image_node, "Imagename", &format!("Image on {}", context))?;
        page.image = Some(Image { name, region });
    }

    if let Some(zones_node) = at_most_one(node, "Zones", &context)? {
        let zone_nodes = element_children(zones_node, "Zone");
        if zone_nodes.is_empty() {
            return Err(Error::LayoutStructure(format!(
                "Zones element of {} must contain at least one Zone",
                context
            )));
        }
        let mut names = HashSet::new();
        for zone_node in zone_nodes {
            let zone = parse_zone(zone_node, &context)?;
            if !names.insert(zone.name.clone()) {
                return Err(Error::LayoutStructure(format!(
                    "duplicate Zonename '{}' on {}",
                    zone.name, context
                )));
            }
            page.zones.push(zone);
        }
    }

    Ok(page)
}

fn parse_zone(node: Node, page_context: &str) -> Result<Zone> {
    let (name, region) = named_region(node, "Zonename", &format!("Zone on {}", page_context))?;
    let context = format!("Zone '{}' on {}", name, page_context);
    let mut zone = Zone {
        name,
        region,
        parts: Vec::new(),
    };

    if let Some(parts_node) = at_most_one(node, "Parts", &context)? {
        let part_nodes = element_children(parts_node, "Part");
        if part_nodes.is_empty() {
            return Err(Error::LayoutStructure(format!(
                "Parts element of {} must contain at least one Part",
                context
            )));
        }
        let mut names = HashSet::new();
        for part_node in part_nodes {
            let (name, region) =
                named_region(part_node, "Partname", &format!("Part in {}", context))?;
            if !names.insert(name.clone()) {
                return Err(Error::LayoutStructure(format!(
                    "duplicate Partname '{}' in {}",
                    name, context
                )));
            }
            zone.parts.push(Part { name, region });
        }
    }

    Ok(zone)
}

/// Read a name attribute plus the four bound attributes; exactly five are required.
fn named_region(node: Node, name_attr: &str, context: &str) -> Result<(String, Region)> {
    let count = node.attributes().filter(|a| a.namespace().is_none()).count();
    if count != 1 + BOUND_ATTRIBUTES.len() {
        let missing: Vec<&str> = std::iter::once(name_attr)
            .chain(BOUND_ATTRIBUTES)
            .filter(|a| node.attribute(*a).is_none())
            .collect();
        return Err(Error::LayoutStructure(format!(
            "{} requires exactly 5 attributes, found {} (missing: {})",
            context,
            count,
            missing.join(", ")
        )));
    }

    let name = node.attribute(name_attr).unwrap_or_default().trim().to_string();
    if name.is_empty() {
        return Err(Error::LayoutStructure(format!("{} has an empty {}", context, name_attr)));
    }

    let mut bounds = [0u32; 4];
    for (slot, attr) in bounds.iter_mut().zip(BOUND_ATTRIBUTES) {
        let text = node.attribute(attr).unwrap_or_default();
        *slot = text.trim().parse().map_err(|_| {
            Error::LayoutStructure(format!(
                "{} '{}': {} \"{}\" is not an unsigned integer",
                context, name, attr, text
            ))
        })?;
    }
    let region = Region::new(bounds[0], bounds[1], bounds[2], bounds[3])
        .map_err(|e| Error::LayoutStructure(format!("{} '{}': {}", context, name, e)))?;

    Ok((name, region))
}

fn element_children<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Vec<Node<'a, 'input>> {
    node.children()
        .filter(|c| c.is_element() && c.tag_name().name() == name)
        .collect()
}

fn at_most_one<'a, 'input>(
    node: Node<'a, 'input>,
    name: &str,
    context: &str,
) -> Result<Option<Node<'a, 'input>>> {
    let mut found = element_children(node, name);
    if found.len() > 1 {
        return Err(Error::LayoutStructure(format!(
            "excess {} elements for {}; only one is allowed",
            name, context
        )));
    }
    Ok(found.pop())
}

fn exactly_one<'a, 'input>(node: Node<'a, 'input>, name: &str, context: &str) -> Result<Node<'a, 'input>> {
    at_most_one(node, name, context)?.ok_or_else(|| {
        Error::LayoutStructure(format!("missing required {} element for {}", name, context))
    })
}

fn parse_bool(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn check_page_containment(page: &Page, options: &LoadOptions) -> Result<()> {
    let bounds = page.size.bounds();
    let mut problems = Vec::new();

    if let Some(image) = &page.image {
        if !bounds.contains(&image.region) {
            problems.push(format!("Image '{}' {} exceeds page size {}", image.name, image.region, page.size));
        }
    }
    for zone in &page.zones {
        if !bounds.contains(&zone.region) {
            problems.push(format!("Zone '{}' {} exceeds page size {}", zone.name, zone.region, page.size));
        }
        for part in &zone.parts {
            if !zone.region.contains(&part.region) {
                problems.push(format!(
                    "Part '{}' {} lies outside Zone '{}' {}",
                    part.name, part.region, zone.name, zone.region
                ));
            }
        }
    }

    for problem in &problems {
        if options.strict_containment {
            return Err(Error::LayoutStructure(format!("Page {}: {}", page.number, problem)));
        }
        log::warn!("Page {}: {}", page.number, problem);
    }
    Ok(())
}

fn check_page_sequence(layout: &Layout, options: &LoadOptions) -> Result<()> {
    let in_sequence = layout
        .pages
        .iter()
        .enumerate()
        .all(|(i, p)| usize::from(p.number) == i + 1);
    if in_sequence {
        return Ok(());
    }

    let numbers: Vec<String> = layout.pages.iter().map(|p| p.number.to_string()).collect();
    let message = format!(
        "page numbers [{}] are not consecutive starting at 1",
        numbers.join(", ")
    );
    if options.strict_page_sequence {
        return Err(Error::LayoutStructure(message));
    }
    log::warn!("{}", message);
    Ok(())
}
