//! Help text for the operation catalog.

use std::fmt::Write;

use crate::catalog::{Catalog, Category, Descriptor};

/// Width of a section rule, including the title.
const RULE_WIDTH: usize = 72;

const LEGEND: &str = "\
 Notation [-a +b X] means: 1st pops last a values, then pushes b values
                           X = -   never throws an error
                           X = m   may throw a memory error
                           X = v   may throw an error by request
                           X = e   may throw any error

 Notation [-a +b|c X] means pushes b values if retval is 0; c otherwise

 Abbreviations:
   str = const char *                              szt = size_t
   l_I = lua_Integer (often int32 or int64)        stk = stack
   l_N = lua_Number  (often double)                 tp = type
";

/// Renders the catalog grouped by category, followed by the legend.
#[must_use]
pub fn render(catalog: &Catalog) -> String {
    let signature_width = catalog
        .names()
        .filter_map(|name| catalog.get(name))
        .map(|d| d.signature.len())
        .max()
        .unwrap_or(0);
    let summary_width = catalog
        .names()
        .filter_map(|name| catalog.get(name))
        .map(|d| d.summary.len())
        .max()
        .unwrap_or(0);

    let mut output = String::new();
    for category in Category::ALL {
        let descriptors = catalog.in_category(category);
        if descriptors.is_empty() {
            continue;
        }
        let _ = writeln!(output, "{}", rule(category.title()));
        let _ = writeln!(output);
        for d in descriptors {
            let _ = writeln!(
                output,
                " {:<signature_width$}  {:<summary_width$}  {}",
                d.signature, d.summary, d.effect
            );
        }
        let _ = writeln!(output);
    }
    let _ = writeln!(output, "{}", rule("key"));
    let _ = writeln!(output);
    output.push_str(LEGEND);
    output
}

/// Renders one operation: signature, effect, summary, and argument shapes.
#[must_use]
pub fn describe(descriptor: &Descriptor) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{}  {}", descriptor.signature, descriptor.effect);
    let _ = writeln!(output, "  {}", descriptor.summary);
    if descriptor.inputs.is_empty() {
        let _ = writeln!(output, "  arguments: (handle)");
    } else {
        let shapes: Vec<_> = descriptor.inputs.iter().map(|s| s.c_type()).collect();
        let _ = writeln!(output, "  arguments: (handle, {})", shapes.join(", "));
    }
    let _ = writeln!(output, "  section: {}", descriptor.category.title());
    output
}

fn rule(title: &str) -> String {
    let head = format!("-- {title} ");
    let fill = RULE_WIDTH.saturating_sub(head.len());
    format!("{head}{}", "-".repeat(fill))
}
