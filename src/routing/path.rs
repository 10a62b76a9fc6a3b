//! Routes from an encoded path such as "[Sol, Alpha Centauri, Barnard's Star]"

use crate::error::PlotError;
use crate::model::{distance, Color, RouteDescriptor, StarDisplayRecord};
use crate::registry::PlotRegistry;

/// Split an encoded path into trimmed star names
pub fn parse_encoded_path(encoded: &str) -> Result<Vec<String>, PlotError> {
    let malformed = |reason: &str| PlotError::Parse {
        input: encoded.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = encoded.trim();
    let inner = trimmed
        .strip_prefix('[')
        .ok_or_else(|| malformed("missing '['"))?
        .strip_suffix(']')
        .ok_or_else(|| malformed("missing ']'"))?;
    if inner.contains(['[', ']']) {
        return Err(malformed("nested brackets"));
    }
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    inner
        .split(',')
        .map(|token| {
            let name = token.trim();
            if name.is_empty() {
                Err(malformed("empty star name"))
            } else {
                Ok(name.to_string())
            }
        })
        .collect()
}

/// Build a finished route from an encoded path of display names
pub fn build_path(
    registry: &PlotRegistry,
    source: &str,
    destination: &str,
    path_name: &str,
    color: Color,
    line_width: f64,
    encoded: &str,
) -> Result<RouteDescriptor, PlotError> {
    let names = parse_encoded_path(encoded)?;
    let stars = names
        .iter()
        .map(|name| registry.find_by_name(name).ok_or_else(|| PlotError::unknown_name(name)))
        .collect::<Result<Vec<&StarDisplayRecord>, PlotError>>()?;

    if stars.len() < 2 {
        return Err(PlotError::Validation(format!(
            "a path needs at least 2 stars, got {}",
            stars.len()
        )));
    }
    if let Some(pair) = stars.windows(2).find(|w| w[0].id == w[1].id) {
        return Err(PlotError::Validation(format!(
            "{} follows itself in the path",
            pair[0].name
        )));
    }

    let name = format!("Route {} to {}, path {}", source, destination, path_name);
    let mut route = RouteDescriptor::new(&name, stars[0], color, line_width);
    for pair in stars.windows(2) {
        route.route_list.push(pair[1].id.clone());
        route.waypoints.push(pair[1].coordinates);
        route.total_length += distance(pair[0].actual_coordinates, pair[1].actual_coordinates);
    }
    route.notes = encoded.to_string();

    tracing::debug!(
        "Built '{}': {} segments, {:.2}ly",
        route.name,
        route.segment_count(),
        route.total_length
    );
    Ok(route)
}
