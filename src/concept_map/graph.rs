//! Keyword-to-node synchronisation and graph edits
//!
//! A node's label is the join key back to the notes' confirmed keywords.
//! Labels are not unique; lookups take the first match in list order.

use rand::Rng;
use uuid::Uuid;

use super::models::{
    ConceptMap, Edge, EdgeData, Node, NodeData, Position, DEFAULT_EDGE_LABEL, EDGE_TYPE,
    KEYWORD_NODE_TYPE,
};
use crate::notes::Note;

/// Side of the square new nodes are scattered over
const SCATTER_EXTENT: f64 = 400.0;

/// Characters of OCR or free text shown as a node label
const TEXT_LABEL_CHARS: usize = 20;

fn new_node_id() -> String {
    format!("node-{}", Uuid::new_v4())
}

fn new_edge_id() -> String {
    format!("edge-{}", Uuid::new_v4())
}

fn scatter<R: Rng>(rng: &mut R) -> Position {
    Position {
        x: rng.gen_range(0.0..SCATTER_EXTENT),
        y: rng.gen_range(0.0..SCATTER_EXTENT),
    }
}

/// Add one node per keyword whose label is not on the map yet.
///
/// Existing labels, and repeats within `keywords`, are skipped. Returns the
/// nodes that were added.
pub fn promote_keywords<S: AsRef<str>>(map: &mut ConceptMap, keywords: &[S]) -> Vec<Node> {
    promote_keywords_with(map, keywords, &mut rand::thread_rng())
}

pub fn promote_keywords_with<S, R>(map: &mut ConceptMap, keywords: &[S], rng: &mut R) -> Vec<Node>
where
    S: AsRef<str>,
    R: Rng,
{
    let mut added = Vec::new();
    for keyword in keywords {
        let keyword = keyword.as_ref();
        if keyword.is_empty() || map.has_label(keyword) {
            log::debug!("concept map: skipping keyword '{}'", keyword);
            continue;
        }
        let node = Node {
            id: new_node_id(),
            kind: Some(KEYWORD_NODE_TYPE.to_string()),
            position: scatter(rng),
            data: NodeData {
                label: keyword.to_string(),
                content: None,
            },
        };
        map.nodes.push(node.clone());
        added.push(node);
    }
    if !added.is_empty() {
        log::info!("concept map: promoted {} keyword(s) onto '{}'", added.len(), map.title);
    }
    added
}

/// How a node label resolved to a note
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeLookup {
    /// A note lists the label among its confirmed keywords
    Keyword { note_id: String },
    /// No keyword match, but a note title contains the label
    Title { note_id: String },
    /// Nothing matched
    NotFound { label: String },
}

impl NodeLookup {
    pub fn note_id(&self) -> Option<&str> {
        match self {
            NodeLookup::Keyword { note_id } | NodeLookup::Title { note_id } => Some(note_id),
            NodeLookup::NotFound { .. } => None,
        }
    }
}

/// Find the note a label points at.
///
/// Exact keyword matches win over title substring matches; within each
/// pass the first note in list order is taken.
pub fn find_note_for_label(notes: &[Note], label: &str) -> NodeLookup {
    if label.is_empty() {
        return NodeLookup::NotFound {
            label: String::new(),
        };
    }
    if let Some(note) = notes.iter().find(|n| n.has_keyword(label)) {
        return NodeLookup::Keyword {
            note_id: note.id.clone(),
        };
    }
    // Short labels can hit unrelated titles here
    if let Some(note) = notes.iter().find(|n| n.title.contains(label)) {
        return NodeLookup::Title {
            note_id: note.id.clone(),
        };
    }
    NodeLookup::NotFound {
        label: label.to_string(),
    }
}

/// Resolve an activated node to a note. `None` if the node does not exist.
pub fn find_note_for_node(map: &ConceptMap, notes: &[Note], node_id: &str) -> Option<NodeLookup> {
    let node = map.node(node_id)?;
    Some(find_note_for_label(notes, node.label()))
}

/// Connect two existing nodes with a placeholder-labelled edge
pub fn connect(
    map: &mut ConceptMap,
    source: &str,
    target: &str,
    label: Option<&str>,
) -> Option<Edge> {
    if map.node(source).is_none() || map.node(target).is_none() {
        log::warn!(
            "concept map: refusing edge {} -> {}, endpoint missing",
            source,
            target
        );
        return None;
    }
    let label = label.unwrap_or(DEFAULT_EDGE_LABEL);
    let edge = Edge {
        id: new_edge_id(),
        source: source.to_string(),
        target: target.to_string(),
        kind: Some(EDGE_TYPE.to_string()),
        label: label.to_string(),
        data: EdgeData {
            label: label.to_string(),
        },
    };
    map.edges.push(edge.clone());
    Some(edge)
}

/// Change one edge's label, keeping the mirrored field in sync
pub fn set_edge_label(map: &mut ConceptMap, edge_id: &str, label: &str) -> bool {
    match map.edges.iter_mut().find(|e| e.id == edge_id) {
        Some(edge) => {
            edge.set_label(label);
            true
        }
        None => false,
    }
}

pub fn delete_edge(map: &mut ConceptMap, edge_id: &str) -> Option<Edge> {
    let pos = map.edges.iter().position(|e| e.id == edge_id)?;
    Some(map.edges.remove(pos))
}

/// Delete a node together with every edge touching it.
///
/// Returns the node and the removed edges.
pub fn delete_node(map: &mut ConceptMap, node_id: &str) -> Option<(Node, Vec<Edge>)> {
    let pos = map.nodes.iter().position(|n| n.id == node_id)?;
    let node = map.nodes.remove(pos);

    let (removed, kept): (Vec<Edge>, Vec<Edge>) =
        map.edges.drain(..).partition(|e| e.touches(node_id));
    map.edges = kept;

    log::debug!(
        "concept map: deleted node {} and {} edge(s)",
        node_id,
        removed.len()
    );
    Some((node, removed))
}

/// Drop edges whose endpoints no longer exist. Returns how many were dropped.
pub fn prune_dangling(map: &mut ConceptMap) -> usize {
    let before = map.edges.len();
    let nodes = &map.nodes;
    map.edges
        .retain(|e| nodes.iter().any(|n| n.id == e.source) && nodes.iter().any(|n| n.id == e.target));
    before - map.edges.len()
}

fn text_label(text: &str, fallback_index: usize) -> String {
    let label: String = text.chars().take(TEXT_LABEL_CHARS).collect();
    if label.is_empty() {
        format!("Note {}", fallback_index)
    } else {
        label
    }
}

/// Add a free-text node, e.g. from OCR output.
///
/// The label is the first characters of the text; the full text is kept
/// as the node content.
pub fn add_text_node(map: &mut ConceptMap, text: &str) -> Node {
    let node = Node {
        id: new_node_id(),
        kind: None,
        position: scatter(&mut rand::thread_rng()),
        data: NodeData {
            label: text_label(text, map.nodes.len() + 1),
            content: Some(text.to_string()),
        },
    };
    map.nodes.push(node.clone());
    node
}

/// Replace the text of a free-text node, refreshing its label
pub fn update_node_text(map: &mut ConceptMap, node_id: &str, text: &str) -> bool {
    let index = map.nodes.iter().position(|n| n.id == node_id);
    let Some(index) = index else {
        return false;
    };
    let label = text_label(text, index + 1);
    let node = &mut map.nodes[index];
    node.data.label = label;
    node.data.content = Some(text.to_string());
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::create_note_for_keyword;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn map_with(labels: &[&str]) -> ConceptMap {
        let mut map = ConceptMap::new("m1".into(), "Test".into());
        promote_keywords(&mut map, labels);
        map
    }

    fn note(title: &str, keywords: &[&str]) -> Note {
        let mut note = Note::new(title.into());
        for k in keywords {
            note.add_user_keyword(k);
        }
        note
    }

    #[test]
    fn test_promotion_skips_existing_labels() {
        let mut map = map_with(&["alpha"]);
        let added = promote_keywords(&mut map, &["alpha", "beta"]);
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].label(), "beta");
        assert_eq!(map.nodes.len(), 2);
    }

    #[test]
    fn test_promoting_twice_never_duplicates() {
        let mut map = ConceptMap::new("m".into(), "t".into());
        let mut rng = StdRng::seed_from_u64(7);
        promote_keywords_with(&mut map, &["cell", "cell"], &mut rng);
        promote_keywords_with(&mut map, &["cell"], &mut rng);
        assert_eq!(map.nodes.iter().filter(|n| n.label() == "cell").count(), 1);

        let pos = map.nodes[0].position;
        assert!((0.0..SCATTER_EXTENT).contains(&pos.x));
        assert!((0.0..SCATTER_EXTENT).contains(&pos.y));
    }

    #[test]
    fn test_lookup_prefers_keyword_over_title() {
        let notes = vec![
            note("Cellular biology", &[]),
            note("Misc", &["cell"]),
            note("Other", &["cell"]),
        ];
        assert_eq!(
            find_note_for_label(&notes, "cell"),
            NodeLookup::Keyword {
                note_id: notes[1].id.clone()
            }
        );
    }

    #[test]
    fn test_lookup_title_fallback_and_miss() {
        let notes = vec![note("Cellular biology", &["mitosis"])];
        assert_eq!(
            find_note_for_label(&notes, "Cell").note_id(),
            Some(notes[0].id.as_str())
        );
        // Keyword matching is case-sensitive
        assert!(matches!(
            find_note_for_label(&notes, "Mitosis"),
            NodeLookup::NotFound { .. }
        ));
        assert!(matches!(
            find_note_for_label(&notes, ""),
            NodeLookup::NotFound { .. }
        ));
    }

    #[test]
    fn test_lookup_by_node() {
        let mut notes = Vec::new();
        let target = create_note_for_keyword(&mut notes, "beta");
        let map = map_with(&["alpha", "beta"]);

        let beta = map.nodes.iter().find(|n| n.label() == "beta").unwrap();
        let lookup = find_note_for_node(&map, &notes, &beta.id).unwrap();
        assert_eq!(lookup.note_id(), Some(target.id.as_str()));
        assert!(find_note_for_node(&map, &notes, "nope").is_none());
    }

    #[test]
    fn test_connect_and_label() {
        let mut map = map_with(&["a", "b"]);
        let (a, b) = (map.nodes[0].id.clone(), map.nodes[1].id.clone());

        let edge = connect(&mut map, &a, &b, None).unwrap();
        assert_eq!(edge.data.label, DEFAULT_EDGE_LABEL);
        assert_eq!(edge.label, DEFAULT_EDGE_LABEL);
        assert!(connect(&mut map, &a, "ghost", None).is_none());

        assert!(set_edge_label(&mut map, &edge.id, "causes"));
        let stored = map.edge(&edge.id).unwrap();
        assert_eq!(stored.label, "causes");
        assert_eq!(stored.data.label, "causes");
        assert!(!set_edge_label(&mut map, "ghost", "x"));
    }

    #[test]
    fn test_delete_node_cascades_exactly() {
        let mut map = map_with(&["a", "b", "c"]);
        let ids: Vec<String> = map.nodes.iter().map(|n| n.id.clone()).collect();
        let ab = connect(&mut map, &ids[0], &ids[1], None).unwrap();
        let bc = connect(&mut map, &ids[1], &ids[2], None).unwrap();
        let ca = connect(&mut map, &ids[2], &ids[0], None).unwrap();

        let (node, removed) = delete_node(&mut map, &ids[0]).unwrap();
        assert_eq!(node.label(), "a");
        let removed: Vec<_> = removed.into_iter().map(|e| e.id).collect();
        assert_eq!(removed, vec![ab.id, ca.id]);
        assert_eq!(map.edges.len(), 1);
        assert_eq!(map.edges[0].id, bc.id);
        assert!(delete_node(&mut map, &ids[0]).is_none());
    }

    #[test]
    fn test_delete_edge_and_prune() {
        let mut map = map_with(&["a", "b"]);
        let (a, b) = (map.nodes[0].id.clone(), map.nodes[1].id.clone());
        let edge = connect(&mut map, &a, &b, Some("x")).unwrap();
        assert!(delete_edge(&mut map, &edge.id).is_some());
        assert!(map.edges.is_empty());

        connect(&mut map, &a, &b, None).unwrap();
        map.nodes.retain(|n| n.id != b);
        assert_eq!(prune_dangling(&mut map), 1);
        assert!(map.edges.is_empty());
    }

    #[test]
    fn test_text_nodes() {
        let mut map = ConceptMap::new("m".into(), "t".into());
        let long = add_text_node(&mut map, "Photosynthesis converts light into energy");
        assert_eq!(long.label(), "Photosynthesis conve");
        assert_eq!(
            long.data.content.as_deref(),
            Some("Photosynthesis converts light into energy")
        );

        let empty = add_text_node(&mut map, "");
        assert_eq!(empty.label(), "Note 2");

        assert!(update_node_text(&mut map, &empty.id, "short"));
        assert_eq!(map.nodes[1].label(), "short");
        assert!(!update_node_text(&mut map, "ghost", "x"));
    }
}
