use super::CanonicalSite;
use super::envelope::{date, id, text, unwrap_list};
use super::status::SiteStatus;
use serde_json::Value;

pub fn site(value: &Value) -> Option<CanonicalSite> {
    let id = id(value)?;
    let raw_status = text(value, &["status", "state"]).unwrap_or_default();
    let status = SiteStatus::parse(&raw_status);

    Some(CanonicalSite {
        label: text(value, &["name", "label", "title"]).unwrap_or_else(|| format!("Site {id}")),
        id,
        status,
        status_label: status.label(&raw_status),
        address: text(value, &["address", "location", "city"]).unwrap_or_default(),
        start_date: date(value, &["start_date", "started_at"]),
        end_date: date(value, &["end_date", "ended_at", "expected_end_date"]),
        photos_before: Vec::new(),
        photos_after: Vec::new(),
    })
}

/// Sorts the photos of every journal entry into before/after buckets.
pub fn attach_photos(site: &mut CanonicalSite, entries: &Value) {
    for entry in unwrap_list(entries, &["entries", "data"]) {
        let photos = entry.get("photos").cloned().unwrap_or(Value::Null);
        for photo in unwrap_list(&photos, &[]) {
            let (url, kind) = match &photo {
                Value::String(url) => (Some(url.clone()), String::new()),
                other => (
                    text(other, &["url", "path", "src"]),
                    text(other, &["type", "kind", "moment"]).unwrap_or_default(),
                ),
            };
            let Some(url) = url else { continue };

            match kind.to_lowercase().as_str() {
                "avant" | "before" => site.photos_before.push(url),
                _ => site.photos_after.push(url),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_site_mapping() {
        let raw = json!({"_id": "s1", "name": "Roof repair", "status": "EN_COURS", "address": "1 rue X"});
        let site = site(&raw).unwrap();
        assert_eq!(site.id, "s1");
        assert_eq!(site.status, SiteStatus::InProgress);
        assert_eq!(site.status_label, "In progress");
        assert_eq!(site.address, "1 rue X");
    }

    #[test]
    fn test_unknown_status_keeps_raw_label() {
        let site = site(&json!({"id": "s2", "status": "ARCHIVED"})).unwrap();
        assert_eq!(site.status, SiteStatus::Unknown);
        assert_eq!(site.status_label, "Archived");
        assert_eq!(site.label, "Site s2");
    }

    #[test]
    fn test_photos_are_split_by_moment() {
        let mut site = site(&json!({"id": "s1"})).unwrap();
        let entries = json!({"entries": [
            {"photos": [{"url": "a.jpg", "type": "avant"}, {"url": "b.jpg", "type": "apres"}]},
            {"photos": [{"url": "c.jpg", "type": "BEFORE"}, "d.jpg", {"type": "before"}]},
            {"note": "no photos"}
        ]});

        attach_photos(&mut site, &entries);
        assert_eq!(site.photos_before, vec!["a.jpg", "c.jpg"]);
        assert_eq!(site.photos_after, vec!["b.jpg", "d.jpg"]);
    }
}
