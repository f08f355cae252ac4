//! Wireframe outline of a room: its floor, ceiling, and the vertical edges
//! at each corner of the ground plan.

use crate::alignment::Vec3;
use crate::facility::Room;

/// A straight line between two points.
pub type Segment = (Vec3, Vec3);

/// Edges of a closed ground plan; the last corner connects back to the first.
pub fn edges_from_vertices_2d(vertices: &[[f64; 2]]) -> Vec<([f64; 2], [f64; 2])> {
    let n = vertices.len();
    (0..n)
        .map(|i| (vertices[i], vertices[(i + 1) % n]))
        .collect()
}

/// All segments needed to draw `room`: one vertical per corner, then the
/// ceiling and floor copy of every ground plan edge.
pub fn wireframe(room: &Room) -> Vec<Segment> {
    let vertices = room.vertices();
    let height = room.height();

    let verticals = vertices
        .iter()
        .map(|&[x, y]| ([x, y, 0.0], [x, y, height]));

    let planes = edges_from_vertices_2d(&vertices)
        .into_iter()
        .flat_map(|([x0, y0], [x1, y1])| {
            [
                ([x0, y0, height], [x1, y1, height]),
                ([x0, y0, 0.0], [x1, y1, 0.0]),
            ]
        });

    verticals.chain(planes).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_wrap_around() {
        let edges = edges_from_vertices_2d(&[[0.0, 0.0], [0.0, 4.0], [8.0, 4.0]]);
        assert_eq!(
            edges,
            vec![
                ([0.0, 0.0], [0.0, 4.0]),
                ([0.0, 4.0], [8.0, 4.0]),
                ([8.0, 4.0], [0.0, 0.0]),
            ]
        );
    }

    #[test]
    fn no_vertices_no_edges() {
        assert!(edges_from_vertices_2d(&[]).is_empty());
    }

    #[test]
    fn shoebox_wireframe() {
        let room = Room::Shoebox {
            dimensions: [8.56, 4.0, 2.4],
        };
        let segments = wireframe(&room);
        assert_eq!(segments.len(), 12);
        assert_eq!(segments[0], ([0.0, 0.0, 0.0], [0.0, 0.0, 2.4]));
        assert!(segments
            .iter()
            .all(|(a, b)| a[2] == b[2] || (a[0] == b[0] && a[1] == b[1])));
    }

    #[test]
    fn polygon_wireframe() {
        let room = Room::Polygon {
            corners: vec![[0.0, 0.0], [0.0, 4.0], [8.0, 4.0], [8.0, 1.5], [6.0, 1.5], [5.0, 0.0]],
            height: 2.4,
        };
        let segments = wireframe(&room);
        assert_eq!(segments.len(), 18);
        let on_ceiling = segments
            .iter()
            .filter(|(a, b)| a[2] == 2.4 && b[2] == 2.4)
            .count();
        assert_eq!(on_ceiling, 6);
    }
}
