use eframe::egui::{Color32, FontId, Painter, Pos2, Rect, Stroke, StrokeKind, vec2};

use crate::catalog::Record;
use crate::util::{count_label, display_value, field_caption};

use super::super::highlight::path_from_top;
use super::super::{NodeKind, RenderGraph};

const MAX_OPACITY: f32 = 0.9;

/// Text shown when hovering node `index`.
pub(in crate::app) fn tooltip_text(
    cache: &RenderGraph,
    records: &[Record],
    index: usize,
) -> String {
    let Some(node) = cache.nodes.get(index) else {
        return String::new();
    };

    match &node.kind {
        NodeKind::Root { record_count } => {
            format!("{}\n{}", node.label, count_label(*record_count, "song", "songs"))
        }
        NodeKind::Cluster { field, child_count } => {
            let holds_songs = cache
                .children
                .get(index)
                .and_then(|children| children.first())
                .and_then(|&child| cache.nodes.get(child))
                .is_some_and(|child| child.is_leaf());
            let members = if holds_songs {
                count_label(*child_count, "song", "songs")
            } else {
                count_label(*child_count, "group", "groups")
            };

            let mut lines = vec![format!("{}: {}", field_caption(field), node.label), members];
            let ancestors = path_from_top(cache, index)
                .into_iter()
                .filter(|&ancestor| ancestor != index)
                .filter_map(|ancestor| cache.nodes.get(ancestor))
                .map(|ancestor| ancestor.label.as_str())
                .collect::<Vec<_>>();
            if !ancestors.is_empty() {
                lines.push(format!("in {}", ancestors.join(" / ")));
            }
            lines.join("\n")
        }
        NodeKind::Leaf { record } => match records.get(*record) {
            Some(record) if !record.is_empty() => record
                .fields()
                .map(|(name, value)| format!("{}: {}", field_caption(name), display_value(value)))
                .collect::<Vec<_>>()
                .join("\n"),
            _ => node.label.clone(),
        },
    }
}

/// Paints the tooltip box with its top-left corner at `anchor`. `fade` runs from 0 to 1.
pub(in crate::app) fn draw_tooltip(painter: &Painter, anchor: Pos2, text: String, fade: f32) {
    let opacity = fade.clamp(0.0, 1.0) * MAX_OPACITY;
    if opacity <= 0.0 || text.is_empty() {
        return;
    }
    let alpha = (opacity * 255.0).round() as u8;

    let galley = painter.layout_no_wrap(
        text,
        FontId::proportional(12.0),
        Color32::from_rgba_unmultiplied(255, 255, 255, alpha),
    );
    let padding = vec2(8.0, 6.0);
    let mut frame = Rect::from_min_size(anchor, galley.size() + padding * 2.0);

    // Keep the box on screen near the right and top edges.
    let clip = painter.clip_rect();
    if frame.right() > clip.right() {
        frame = frame.translate(vec2(clip.right() - frame.right(), 0.0));
    }
    if frame.top() < clip.top() {
        frame = frame.translate(vec2(0.0, clip.top() - frame.top()));
    }

    painter.rect_filled(frame, 4.0, Color32::from_rgba_unmultiplied(24, 28, 36, alpha));
    painter.rect_stroke(
        frame,
        4.0,
        Stroke::new(1.0, Color32::from_rgba_unmultiplied(255, 255, 255, alpha / 4)),
        StrokeKind::Inside,
    );
    painter.galley(frame.min + padding, galley, Color32::WHITE);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::graph::render_graph_for_tree;
    use crate::hierarchy::{Tree, build};

    fn records() -> Vec<Record> {
        vec![
            Record::from_iter([("producer", "A"), ("album", "X"), ("track", "t1")]),
            Record::from_iter([("producer", "A"), ("album", "Y"), ("track", "t2")]),
            Record::from_iter([("producer", "B"), ("album", ""), ("track", "t3")]),
        ]
    }

    fn tree_for(records: &[Record], keys: &[&str]) -> Tree {
        let keys = keys.iter().map(|key| key.to_string()).collect::<Vec<_>>();
        build(records, &keys, &Default::default()).unwrap()
    }

    #[test]
    fn root_reports_the_song_count() {
        let records = records();
        let tree = tree_for(&records, &["producer", "album"]);
        let graph = render_graph_for_tree(&tree, &records, "track");
        assert_eq!(tooltip_text(&graph, &records, 0), "catalog\n3 songs");
    }

    #[test]
    fn clusters_show_field_members_and_ancestors() {
        let records = records();
        let tree = tree_for(&records, &["producer", "album"]);
        let graph = render_graph_for_tree(&tree, &records, "track");

        // root, A, X, t1, Y, t2, B, (empty), t3
        assert_eq!(tooltip_text(&graph, &records, 1), "Producer: A\n2 groups\nin catalog");
        assert_eq!(tooltip_text(&graph, &records, 7), "Album: (empty)\n1 song\nin catalog / B");
    }

    #[test]
    fn top_level_clusters_without_a_root_have_no_ancestor_line() {
        let records = records();
        let graph = render_graph_for_tree(&tree_for(&records, &["producer"]), &records, "track");
        assert_eq!(tooltip_text(&graph, &records, 0), "Producer: A\n2 songs");
    }

    #[test]
    fn leaves_list_every_field() {
        let records = records();
        let graph = render_graph_for_tree(&tree_for(&records, &["producer"]), &records, "track");
        assert_eq!(
            tooltip_text(&graph, &records, 4),
            "Producer: B\nAlbum: (empty)\nTrack: t3"
        );
        assert_eq!(tooltip_text(&graph, &records, 99), "");
    }
}
