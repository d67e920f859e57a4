//! Strict selection helpers over fetched resource lists.
//!
//! The API has no by-name endpoints, so name lookups list the enclosing scope
//! and scan it. These helpers are strict: a requested key with no match fails
//! the whole call with [`ApiError::NotFound`] naming that key, and a name
//! shared by several resources fails with [`ApiError::AmbiguousName`].
//! Partial results are never returned for an explicit request.

use std::collections::HashMap;

use crate::{ApiError, Named};

/// Returns the single resource called `name`.
pub fn find_by_name<R: Named>(items: Vec<R>, name: &str) -> Result<R, ApiError> {
    let mut matches = items.into_iter().filter(|r| r.name() == name);

    let found = matches
        .next()
        .ok_or_else(|| ApiError::resource_not_found(R::KIND, format_args!("with name {name}")))?;

    let extra = matches.count();
    if extra > 0 {
        return Err(ApiError::AmbiguousName {
            kind: R::KIND,
            name: name.to_string(),
            matches: extra + 1,
        });
    }

    Ok(found)
}

/// Selects the resources whose identifier is in `ids`, in the order requested.
///
/// An empty `ids` returns `items` unfiltered.
pub fn filter_by_ids<R>(items: Vec<R>, ids: &[R::Id]) -> Result<Vec<R>, ApiError>
where
    R: Named + Clone,
{
    if ids.is_empty() {
        return Ok(items);
    }

    let by_id: HashMap<&R::Id, &R> = items.iter().map(|r| (r.id(), r)).collect();

    ids.iter()
        .map(|id| {
            by_id
                .get(id)
                .map(|r| (*r).clone())
                .ok_or_else(|| ApiError::resource_not_found(R::KIND, format_args!("with ID {id}")))
        })
        .collect()
}

/// Selects the resources whose name is in `names`, in the order requested.
///
/// An empty `names` returns `items` unfiltered.
pub fn filter_by_names<R, S>(items: Vec<R>, names: &[S]) -> Result<Vec<R>, ApiError>
where
    R: Named + Clone,
    S: AsRef<str>,
{
    if names.is_empty() {
        return Ok(items);
    }

    let mut by_name: HashMap<&str, Vec<&R>> = HashMap::new();
    for r in &items {
        by_name.entry(r.name()).or_default().push(r);
    }

    names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            match by_name.get(name).map(Vec::as_slice) {
                Some([only]) => Ok((*only).clone()),
                Some(many) if many.len() > 1 => Err(ApiError::AmbiguousName {
                    kind: R::KIND,
                    name: name.to_string(),
                    matches: many.len(),
                }),
                _ => Err(ApiError::resource_not_found(
                    R::KIND,
                    format_args!("with name {name}"),
                )),
            }
        })
        .collect()
}
