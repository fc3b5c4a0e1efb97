//! The plane sweep.
//!
//! Events are drained in ascending order from the queue; left events
//! enter the status, right events leave it and decide whether their edge
//! lies on the output boundary. Intersections divide edges on the fly at
//! rasterized points, and collinear overlaps cancel duplicate owners by
//! XOR. Both the queue and the status are ordered vectors searched with
//! live comparators; divisions keep the moved endpoint on the same
//! carrier line, so established comparisons stay valid.

use std::cmp::Ordering;

use crate::chain::ChainAssembler;
use crate::error::{BoolError, Result};
use crate::event::{Ev, Event, EventPool, Line};
use crate::point::{PointStore, Pt};
use crate::BoolOp;
use polyscad_kernel_poly::Polygon2;

pub(crate) struct Sweep {
    pts: PointStore,
    pool: EventPool,
    /// Pending events, sorted descending (pop = minimum).
    q: Vec<Ev>,
    /// Active left events, bottom to top.
    s: Vec<Ev>,
    chains: ChainAssembler,
    op: BoolOp,
    mask_all: u8,
    mask_neg: u8,
    /// Per-input maximum snapped x, for the CUT/SUB early exits.
    max_x: [i64; 2],
}

impl Sweep {
    pub(crate) fn run(a: &Polygon2, b: &Polygon2, op: BoolOp) -> Result<Polygon2> {
        let mut sw = Sweep {
            pts: PointStore::new(),
            pool: EventPool::new(),
            q: Vec::new(),
            s: Vec::new(),
            chains: ChainAssembler::new(),
            op,
            mask_all: 0b11,
            mask_neg: if op == BoolOp::Sub { 0b10 } else { 0 },
            max_x: [i64::MIN; 2],
        };
        sw.add_polygon(a, 0);
        sw.add_polygon(b, 1);
        sw.main_loop()?;
        if sw.chains.open_ends() != 0 {
            return Err(BoolError::Internal("open chain after sweep".into()));
        }
        let Sweep {
            mut pts, chains, ..
        } = sw;
        chains.into_polygon(&mut pts)
    }

    // ------------------------------------------------------------------
    // setup

    fn add_polygon(&mut self, poly: &Polygon2, id: usize) {
        let owner = 1u8 << id;
        for path in &poly.paths {
            let mut ring: Vec<Pt> = Vec::with_capacity(path.indices.len());
            for &i in &path.indices {
                let v = poly.points[i as usize];
                let p = self.pts.insert(v.coord.x, v.coord.y, v.color, v.loc);
                if ring.last() != Some(&p) {
                    ring.push(p);
                }
            }
            while ring.len() > 1 && ring.first() == ring.last() {
                ring.pop();
            }
            if ring.len() < 2 {
                continue;
            }
            for p in &ring {
                self.max_x[id] = self.max_x[id].max(self.pts.key(*p).0);
            }
            for i in 0..ring.len() {
                self.add_segment(ring[i], ring[(i + 1) % ring.len()], owner);
            }
        }
    }

    fn add_segment(&mut self, a: Pt, b: Pt, owner: u8) {
        let (l, r) = match self.pts.cmp_pt(a, b) {
            Ordering::Less => (a, b),
            Ordering::Greater => (b, a),
            Ordering::Equal => return,
        };
        let line = Line::through(self.pts.coord(l), self.pts.coord(r));
        let el = self.pool.push(Event {
            p: l,
            left: true,
            other: Ev(0),
            owner,
            below: 0,
            line,
            in_s: false,
        });
        let er = self.pool.push(Event {
            p: r,
            left: false,
            other: el,
            owner,
            below: 0,
            line,
            in_s: false,
        });
        self.pool.get_mut(el).other = er;
        self.q_insert(el);
        self.q_insert(er);
    }

    // ------------------------------------------------------------------
    // queue and status primitives

    fn q_insert(&mut self, e: Ev) {
        // q is sorted descending, so the comparator runs target-first
        let pos = self
            .q
            .binary_search_by(|&m| self.pool.cmp_queue(&self.pts, e, m))
            .unwrap_or_else(|p| p);
        self.q.insert(pos, e);
    }

    fn q_remove(&mut self, e: Ev) {
        if let Some(pos) = self.q.iter().position(|&m| m == e) {
            self.q.remove(pos);
        }
    }

    fn s_insert(&mut self, e: Ev) -> usize {
        let pos = self
            .s
            .binary_search_by(|&m| self.pool.cmp_status(&self.pts, e, m).reverse())
            .unwrap_or_else(|p| p);
        self.s.insert(pos, e);
        self.pool.get_mut(e).in_s = true;
        pos
    }

    fn s_pos(&self, e: Ev) -> Option<usize> {
        self.s.iter().position(|&m| m == e)
    }

    fn s_remove(&mut self, e: Ev) -> Result<usize> {
        let pos = self
            .s_pos(e)
            .ok_or_else(|| BoolError::Internal("status entry missing".into()))?;
        self.s.remove(pos);
        self.pool.get_mut(e).in_s = false;
        Ok(pos)
    }

    /// Remove from the status and reschedule: used when a rounding step
    /// discovers that an edge's left endpoint lies on another edge.
    fn kick(&mut self, e: Ev) -> Result<()> {
        if self.pool.get(e).in_s {
            self.s_remove(e)?;
        }
        self.q_insert(e);
        Ok(())
    }

    // ------------------------------------------------------------------
    // classification

    fn inside(&self, mask: u8) -> bool {
        match self.op {
            BoolOp::Add => mask != 0,
            BoolOp::Cut | BoolOp::Sub => (mask ^ self.mask_neg ^ self.mask_all) == 0,
            BoolOp::Xor => mask.count_ones() % 2 == 1,
        }
    }

    /// Snapped x beyond which the sweep cannot produce further output.
    fn stop_x(&self) -> Option<i64> {
        match self.op {
            BoolOp::Cut => Some(self.max_x[0].min(self.max_x[1])),
            BoolOp::Sub => Some(self.max_x[0]),
            BoolOp::Add | BoolOp::Xor => None,
        }
    }

    // ------------------------------------------------------------------
    // main loop

    fn main_loop(&mut self) -> Result<()> {
        let stop = self.stop_x();
        while let Some(e) = self.q.pop() {
            if let Some(stop) = stop {
                // Every boundary edge's right event lies at or before the
                // threshold, so nothing emitted is lost by stopping here.
                if self.pool.x_of(&self.pts, e) > stop {
                    break;
                }
            }
            if self.pool.get(e).left {
                self.handle_left(e)?;
            } else {
                self.handle_right(e)?;
            }
        }
        Ok(())
    }

    fn handle_left(&mut self, e: Ev) -> Result<()> {
        let pos = self.s_insert(e);
        let pred = if pos > 0 { Some(self.s[pos - 1]) } else { None };
        let succ = self.s.get(pos + 1).copied();

        let below = match pred {
            Some(p) => {
                let pe = self.pool.get(p);
                pe.below ^ pe.owner
            }
            None => 0,
        };
        self.pool.get_mut(e).below = below;

        if let Some(n) = succ {
            self.check_intersection(e, n)?;
        }
        // the first check may have kicked e back to the queue
        if self.pool.get(e).in_s {
            if let Some(p) = pred {
                if self.pool.get(p).in_s {
                    self.check_intersection(p, e)?;
                }
            }
        }
        Ok(())
    }

    fn handle_right(&mut self, e: Ev) -> Result<()> {
        let o = self.pool.get(e).other;
        let pos = self.s_remove(o)?;
        let pred = if pos > 0 { Some(self.s[pos - 1]) } else { None };
        let succ = self.s.get(pos).copied();

        let oe = self.pool.get(o);
        let below = oe.below;
        let above = below ^ oe.owner;
        let (left_pt, right_pt) = (oe.p, self.pool.get(e).p);
        let below_in = self.inside(below);
        let above_in = self.inside(above);
        if below_in != above_in {
            self.chains.add_edge(left_pt, right_pt, below_in)?;
        }

        if let (Some(p), Some(n)) = (pred, succ) {
            self.check_intersection(p, n)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // intersection handling

    /// Examine a newly adjacent pair (`lo` below `hi` in the status).
    fn check_intersection(&mut self, lo: Ev, hi: Ev) -> Result<()> {
        if lo == hi {
            return Ok(());
        }
        let lp = self.pool.get(lo).p;
        let lq = self.pool.get(self.pool.get(lo).other).p;
        let hp = self.pool.get(hi).p;
        let hq = self.pool.get(self.pool.get(hi).other).p;

        // collinear pair: overlap is the delicate case
        if self.pool.side_of(&self.pts, hp, lo) == Ordering::Equal
            && self.pool.side_of(&self.pts, hq, lo) == Ordering::Equal
        {
            if self.segments_overlap(lo, hi) {
                return self.handle_overlap(lo, hi);
            }
            return Ok(());
        }

        // a shared endpoint of non-collinear edges is a mere touch
        if lp == hp || lp == hq || lq == hp || lq == hq {
            return Ok(());
        }

        let Some((x, y)) = self.pool.get(lo).line.isec(&self.pool.get(hi).line) else {
            return Ok(());
        };
        let lo_loc = self.pts.get(lp).loc;
        let lo_color = self.pts.get(lp).color;
        let ip = self.pts.insert(x, y, lo_color, lo_loc);
        if !self.pool.in_span(&self.pts, ip, lo) || !self.pool.in_span(&self.pts, ip, hi) {
            return Ok(());
        }

        if ip == lp {
            // lo's left endpoint lies on hi (after rounding)
            if self.strictly_inside(ip, hi) {
                self.divide(hi, ip)?;
                self.kick(lo)?;
            }
        } else if ip == hp {
            if self.strictly_inside(ip, lo) {
                self.divide(lo, ip)?;
                self.kick(hi)?;
            }
        } else if ip == lq {
            if self.strictly_inside(ip, hi) {
                self.divide(hi, ip)?;
            }
        } else if ip == hq {
            if self.strictly_inside(ip, lo) {
                self.divide(lo, ip)?;
            }
        } else {
            // proper crossing
            self.divide(lo, ip)?;
            self.divide(hi, ip)?;
        }
        Ok(())
    }

    fn strictly_inside(&self, p: Pt, e: Ev) -> bool {
        p != self.pool.get(e).p
            && p != self.pool.get(self.pool.get(e).other).p
            && self.pool.in_span(&self.pts, p, e)
    }

    /// Collinear segments sharing more than one point?
    fn segments_overlap(&self, lo: Ev, hi: Ev) -> bool {
        let lp = self.pool.get(lo).p;
        let lq = self.pool.get(self.pool.get(lo).other).p;
        let hp = self.pool.get(hi).p;
        let hq = self.pool.get(self.pool.get(hi).other).p;
        let start = if self.pts.cmp_pt(lp, hp) == Ordering::Less {
            hp
        } else {
            lp
        };
        let end = if self.pts.cmp_pt(lq, hq) == Ordering::Less {
            lq
        } else {
            hq
        };
        self.pts.cmp_pt(start, end) == Ordering::Less
    }

    /// Cancel duplicate contributions on a collinear overlap.
    ///
    /// Endpoint-aligning divisions reduce the general case to identical
    /// segments (the divided halves re-check when they are inserted);
    /// identical segments then merge: the lower edge keeps the XOR'd
    /// owner, the upper becomes transparent, and its `below` is rewritten
    /// so the region above the pair keeps its mask.
    fn handle_overlap(&mut self, lo: Ev, hi: Ev) -> Result<()> {
        let lp = self.pool.get(lo).p;
        let lq = self.pool.get(self.pool.get(lo).other).p;
        let hp = self.pool.get(hi).p;
        let hq = self.pool.get(self.pool.get(hi).other).p;

        if lp != hp {
            if self.pts.cmp_pt(lp, hp) == Ordering::Less {
                self.divide(lo, hp)?;
            } else {
                self.divide(hi, lp)?;
            }
            return Ok(());
        }
        if lq != hq {
            if self.pts.cmp_pt(lq, hq) == Ordering::Less {
                self.divide(hi, lq)?;
            } else {
                self.divide(lo, hq)?;
            }
        }
        // now identical
        let hi_owner = self.pool.get(hi).owner;
        let le = self.pool.get_mut(lo);
        le.owner ^= hi_owner;
        let (lo_below, lo_owner) = (le.below, le.owner);
        let he = self.pool.get_mut(hi);
        he.below = lo_below ^ lo_owner;
        he.owner = 0;
        Ok(())
    }

    /// Divide edge `e` (a left event) at interior point `m`: the right
    /// half becomes a fresh event pair, `owner`, `below` and the carrier
    /// line carry over.
    fn divide(&mut self, e: Ev, m: Pt) -> Result<()> {
        let r = self.pool.get(e).other;
        let (owner, below, line) = {
            let ee = self.pool.get(e);
            (ee.owner, ee.below, ee.line)
        };
        let nr = self.pool.push(Event {
            p: m,
            left: false,
            other: e,
            owner,
            below,
            line,
            in_s: false,
        });
        let nl = self.pool.push(Event {
            p: m,
            left: true,
            other: r,
            owner,
            below,
            line,
            in_s: false,
        });
        self.pool.get_mut(e).other = nr;
        self.pool.get_mut(r).other = nl;

        // Rounding can snap the division point past the right endpoint;
        // the unprocessed half then runs backwards and its two events
        // swap their left/right roles.
        if self.pts.cmp_pt(m, self.pool.get(r).p) == Ordering::Greater {
            self.q_remove(r);
            self.pool.get_mut(r).left = true;
            self.pool.get_mut(nl).left = false;
            self.q_insert(r);
        }
        self.q_insert(nr);
        self.q_insert(nl);
        Ok(())
    }
}
