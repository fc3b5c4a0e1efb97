//! Output chain assembly.
//!
//! Boundary edges arrive one at a time from the sweep and are linked
//! into open chains by endpoint identity; when an edge closes a chain
//! into a ring, a seed is recorded. Chains are doubly-linked node rings
//! with at most two neighbors per node; a union-find over nodes answers
//! "same chain?" in effectively constant time when both endpoints of a
//! new edge are already known.

use std::collections::HashMap;

use crate::error::{BoolError, Result};
use crate::point::{PointStore, Pt};
use polyscad_kernel_poly::{Path2, Polygon2};

#[derive(Debug, Clone, Copy)]
struct Node {
    p: Pt,
    nb: [u32; 2],
    nnb: u8,
}

#[derive(Debug, Clone, Copy)]
struct RingSeed {
    /// Node at the left endpoint of the closing edge.
    a: u32,
    /// Node at the right endpoint of the closing edge.
    b: u32,
    /// Whether the output interior lies below the closing edge.
    inside_below: bool,
}

/// Assembles emitted boundary edges into closed output paths.
#[derive(Debug, Default)]
pub struct ChainAssembler {
    nodes: Vec<Node>,
    uf: Vec<u32>,
    ends: HashMap<Pt, u32>,
    rings: Vec<RingSeed>,
}

impl ChainAssembler {
    /// Create an empty assembler.
    pub fn new() -> Self {
        Self::default()
    }

    fn new_node(&mut self, p: Pt) -> u32 {
        let id = self.nodes.len() as u32;
        self.nodes.push(Node {
            p,
            nb: [u32::MAX; 2],
            nnb: 0,
        });
        self.uf.push(id);
        id
    }

    fn find(&mut self, mut n: u32) -> u32 {
        while self.uf[n as usize] != n {
            let up = self.uf[self.uf[n as usize] as usize];
            self.uf[n as usize] = up;
            n = up;
        }
        n
    }

    fn union(&mut self, a: u32, b: u32) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.uf[ra as usize] = rb;
        }
    }

    fn link(&mut self, a: u32, b: u32) -> Result<()> {
        for n in [a, b] {
            if self.nodes[n as usize].nnb >= 2 {
                return Err(BoolError::Internal("chain node with three neighbors".into()));
            }
        }
        let an = self.nodes[a as usize].nnb as usize;
        self.nodes[a as usize].nb[an] = b;
        self.nodes[a as usize].nnb += 1;
        let bn = self.nodes[b as usize].nnb as usize;
        self.nodes[b as usize].nb[bn] = a;
        self.nodes[b as usize].nnb += 1;
        Ok(())
    }

    /// Attach one boundary edge, `left` → `right` in sweep order.
    ///
    /// `inside_below` records whether the output interior lies below the
    /// edge; the closing edge's flag later orients its ring.
    pub fn add_edge(&mut self, left: Pt, right: Pt, inside_below: bool) -> Result<()> {
        match (self.ends.remove(&left), self.ends.remove(&right)) {
            (None, None) => {
                let a = self.new_node(left);
                let b = self.new_node(right);
                self.link(a, b)?;
                self.union(a, b);
                self.ends.insert(left, a);
                self.ends.insert(right, b);
            }
            (Some(a), None) => {
                let b = self.new_node(right);
                self.link(a, b)?;
                self.union(a, b);
                self.ends.insert(right, b);
            }
            (None, Some(b)) => {
                let a = self.new_node(left);
                self.link(a, b)?;
                self.union(a, b);
                self.ends.insert(left, a);
            }
            (Some(a), Some(b)) => {
                if self.find(a) == self.find(b) {
                    // closes a ring
                    self.link(a, b)?;
                    self.rings.push(RingSeed {
                        a,
                        b,
                        inside_below,
                    });
                } else {
                    // joins two open chains
                    self.link(a, b)?;
                    self.union(a, b);
                }
            }
        }
        Ok(())
    }

    /// Number of open chain endpoints (zero after a complete sweep).
    pub fn open_ends(&self) -> usize {
        self.ends.len()
    }

    /// Emit all closed rings as paths of a single polygon.
    ///
    /// Traversal direction comes from the closing edge: if the output
    /// interior is above it (exterior below), walking left → right yields
    /// a counter-clockwise ring; otherwise the walk is reversed, which
    /// makes holes come out clockwise.
    pub fn into_polygon(self, pts: &mut PointStore) -> Result<Polygon2> {
        let ChainAssembler { nodes, rings, .. } = self;
        let mut out = Polygon2::new();
        for seed in rings {
            let (start, second) = if seed.inside_below {
                (seed.b, seed.a)
            } else {
                (seed.a, seed.b)
            };
            let mut indices = Vec::new();
            let mut prev = start;
            let mut cur = second;
            indices.push(out_index(pts, &mut out, nodes[start as usize].p));
            while cur != start {
                indices.push(out_index(pts, &mut out, nodes[cur as usize].p));
                let node = nodes[cur as usize];
                if node.nnb != 2 {
                    return Err(BoolError::Internal("open ring during emit".into()));
                }
                let next = if node.nb[0] == prev { node.nb[1] } else { node.nb[0] };
                prev = cur;
                cur = next;
            }
            if indices.len() >= 3 {
                out.paths.push(Path2::new(indices));
            }
        }
        Ok(out)
    }
}

fn out_index(pts: &mut PointStore, out: &mut Polygon2, p: Pt) -> u32 {
    let coord = pts.coord(p);
    pts.out_index(p, |rp| {
        let i = out.points.len() as u32;
        out.points.push(polyscad_kernel_poly::Vertex2::new(coord, rp.color, rp.loc));
        i
    })
}
