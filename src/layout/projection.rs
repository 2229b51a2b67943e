//! Whitespace/projection analyzer (L9): text-density profiles, gap
//! detection, adaptive column clustering and hybrid row detection.

use std::collections::HashMap;

use crate::model::state::TextElement;

use super::detector::TableDetectionMode;

/// A 1-D density histogram along one axis, built by accumulating each
/// element's extent-on-the-other-axis into every bin it spans.
#[derive(Debug, Clone)]
pub struct ProjectionProfile {
    axis_min: f64,
    axis_max: f64,
    bin_size: f64,
    density: Vec<f64>,
}

impl ProjectionProfile {
    pub fn min(&self) -> f64 {
        self.axis_min
    }

    pub fn max(&self) -> f64 {
        self.axis_max
    }

    pub fn bin_count(&self) -> usize {
        self.density.len()
    }

    fn bin_bounds(&self, i: usize) -> (f64, f64) {
        (
            self.axis_min + i as f64 * self.bin_size,
            self.axis_min + (i + 1) as f64 * self.bin_size,
        )
    }

    /// Maximal contiguous runs of bins at or below `threshold`, widened to
    /// true bin bounds and filtered to those at least `min_gap` wide.
    pub fn gaps(&self, threshold: f64, min_gap: f64) -> Vec<(f64, f64)> {
        let mut out = Vec::new();
        let mut run_start: Option<usize> = None;
        for i in 0..=self.density.len() {
            let below = i < self.density.len() && self.density[i] <= threshold;
            if below {
                run_start.get_or_insert(i);
            } else if let Some(s) = run_start.take() {
                let (start, _) = self.bin_bounds(s);
                let (_, end) = self.bin_bounds(i - 1);
                if end - start >= min_gap {
                    out.push((start, end));
                }
            }
        }
        out
    }
}

/// Horizontal profile: density along y, accumulating element widths.
pub fn horizontal_profile(elements: &[TextElement], bin_size: f64) -> ProjectionProfile {
    build_profile(elements, bin_size, true)
}

/// Vertical profile: density along x, accumulating element heights.
pub fn vertical_profile(elements: &[TextElement], bin_size: f64) -> ProjectionProfile {
    build_profile(elements, bin_size, false)
}

fn build_profile(elements: &[TextElement], bin_size: f64, horizontal: bool) -> ProjectionProfile {
    if elements.is_empty() {
        return ProjectionProfile {
            axis_min: 0.0,
            axis_max: 0.0,
            bin_size,
            density: Vec::new(),
        };
    }
    let (axis_min, axis_max) = if horizontal {
        (
            elements.iter().map(|e| e.bottom()).fold(f64::INFINITY, f64::min),
            elements.iter().map(|e| e.top()).fold(f64::NEG_INFINITY, f64::max),
        )
    } else {
        (
            elements.iter().map(|e| e.left()).fold(f64::INFINITY, f64::min),
            elements.iter().map(|e| e.right()).fold(f64::NEG_INFINITY, f64::max),
        )
    };
    let span = (axis_max - axis_min).max(bin_size);
    let n_bins = (span / bin_size).ceil().max(1.0) as usize;
    let mut density = vec![0.0; n_bins];

    for el in elements {
        let (lo, hi, contribution) = if horizontal {
            (el.bottom(), el.top(), el.width)
        } else {
            (el.left(), el.right(), el.height)
        };
        let first_bin = (((lo - axis_min) / bin_size).floor().max(0.0)) as usize;
        let last_bin = ((((hi - axis_min) / bin_size).ceil() - 1.0).max(0.0)) as usize;
        for b in first_bin..=last_bin.min(n_bins.saturating_sub(1)) {
            density[b] += contribution;
        }
    }

    ProjectionProfile {
        axis_min,
        axis_max,
        bin_size,
        density,
    }
}

/// Parameters for adaptive column clustering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnParams {
    pub cluster_eps: f64,
    pub min_support: usize,
}

impl Default for ColumnParams {
    fn default() -> Self {
        Self {
            cluster_eps: 3.0,
            min_support: 2,
        }
    }
}

fn cluster_1d(sorted_values: &[f64], eps: f64) -> Vec<Vec<f64>> {
    let mut clusters: Vec<Vec<f64>> = Vec::new();
    for &v in sorted_values {
        if let Some(last) = clusters.last_mut() {
            if v - last.last().copied().unwrap() <= eps {
                last.push(v);
                continue;
            }
        }
        clusters.push(vec![v]);
    }
    clusters
}

/// Cluster the left and right edges of every text element; keep clusters
/// with at least `min_support` members, then always widen the result to
/// the region's extreme left and right edges.
pub fn detect_columns_adaptive(elements: &[TextElement], params: &ColumnParams) -> Vec<f64> {
    if elements.is_empty() {
        return Vec::new();
    }
    let mut edges: Vec<f64> = Vec::with_capacity(elements.len() * 2);
    for e in elements {
        edges.push(e.left());
        edges.push(e.right());
    }
    edges.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let mut centers: Vec<f64> = cluster_1d(&edges, params.cluster_eps)
        .into_iter()
        .filter(|c| c.len() >= params.min_support)
        .map(|c| c.iter().sum::<f64>() / c.len() as f64)
        .collect();

    let left = elements.iter().map(|e| e.left()).fold(f64::INFINITY, f64::min);
    let right = elements.iter().map(|e| e.right()).fold(f64::NEG_INFINITY, f64::max);
    centers.push(left);
    centers.push(right);
    centers.sort_by(|a, b| a.partial_cmp(b).unwrap());
    centers.dedup_by(|a, b| (*a - *b).abs() < 1e-6);
    centers
}

/// Adaptive column detection, with any cluster center snapped onto a
/// nearby ruling-line x-coordinate when one exists within `cluster_eps`.
pub fn detect_columns_hybrid(elements: &[TextElement], ruling_x: &[f64], params: &ColumnParams) -> Vec<f64> {
    let text_cols = detect_columns_adaptive(elements, params);
    let mut merged: Vec<f64> = text_cols
        .into_iter()
        .map(|c| {
            ruling_x
                .iter()
                .min_by(|a, b| (**a - c).abs().partial_cmp(&(**b - c).abs()).unwrap())
                .filter(|&&rx| (rx - c).abs() <= params.cluster_eps)
                .copied()
                .unwrap_or(c)
        })
        .collect();
    merged.sort_by(|a, b| a.partial_cmp(b).unwrap());
    merged.dedup_by(|a, b| (*a - *b).abs() < 1e-6);
    merged
}

/// Legacy single-signal column detection: cluster left edges only, with a
/// fixed 5pt epsilon and a support floor scaled to group size.
pub fn detect_columns_legacy(elements: &[TextElement]) -> Vec<f64> {
    if elements.is_empty() {
        return Vec::new();
    }
    let mut lefts: Vec<f64> = elements.iter().map(|e| e.left()).collect();
    lefts.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let threshold = (0.1 * elements.len() as f64).min(3.0).max(1.0);

    let mut cols: Vec<f64> = cluster_1d(&lefts, 5.0)
        .into_iter()
        .filter(|c| c.len() as f64 >= threshold)
        .map(|c| c.iter().sum::<f64>() / c.len() as f64)
        .collect();

    let rightmost = elements.iter().map(|e| e.right()).fold(f64::NEG_INFINITY, f64::max);
    cols.push(rightmost);
    cols.sort_by(|a, b| a.partial_cmp(b).unwrap());
    cols
}

/// Parameters for hybrid row detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowParams {
    pub bin_size: f64,
    pub gap_density_threshold: f64,
    /// Floor used by the lattice-mode gap pass; stream mode instead scales
    /// directly off the average font size. Not pinned by name elsewhere in
    /// the design, so chosen to sit comfortably below a typical line gap.
    pub min_gap_default: f64,
    pub alignment_tolerance: f64,
}

impl Default for RowParams {
    fn default() -> Self {
        Self {
            bin_size: 2.0,
            gap_density_threshold: 0.01,
            min_gap_default: 5.0,
            alignment_tolerance: 2.0,
        }
    }
}

/// Ratio of the vertical overlap between two elements' bounding boxes to
/// the shorter of their two heights. Symmetric, and clamped to `[0, 1]`.
pub fn vertical_overlap_ratio(a: &TextElement, b: &TextElement) -> f64 {
    let overlap = (a.top().min(b.top()) - a.bottom().max(b.bottom())).max(0.0);
    if overlap <= 0.0 {
        return 0.0;
    }
    let delta = (a.top() - a.bottom()).min(b.top() - b.bottom());
    if delta <= 0.0 {
        return 0.0;
    }
    (overlap / delta).min(1.0)
}

fn adaptive_tau(sorted_by_y: &[&TextElement], avg_font_size: f64) -> f64 {
    if sorted_by_y.len() < 2 || avg_font_size <= 0.0 {
        return 0.10;
    }
    let gaps: Vec<f64> = sorted_by_y
        .windows(2)
        .map(|w| (w[1].y - w[0].top()).max(0.0))
        .collect();
    let avg_gap = gaps.iter().sum::<f64>() / gaps.len() as f64;
    let ratio = avg_gap / avg_font_size;
    if ratio < 0.3 {
        0.05
    } else if ratio < 0.8 {
        0.10
    } else {
        0.15
    }
}

fn gap_pass(elements: &[TextElement], mode: TableDetectionMode, avg_font_size: f64, params: &RowParams) -> Vec<f64> {
    let profile = horizontal_profile(elements, params.bin_size);
    if profile.bin_count() == 0 {
        return Vec::new();
    }
    let min_gap = match mode {
        TableDetectionMode::Lattice => params.min_gap_default.max(2.0 * avg_font_size),
        TableDetectionMode::Stream => 0.5 * avg_font_size,
    };
    let mut out = vec![profile.min()];
    out.extend(profile.gaps(params.gap_density_threshold, min_gap).into_iter().map(|(s, e)| (s + e) / 2.0));
    out.push(profile.max());
    out
}

fn overlap_pass(elements: &[TextElement]) -> Vec<f64> {
    if elements.is_empty() {
        return Vec::new();
    }
    let mut sorted: Vec<&TextElement> = elements.iter().collect();
    sorted.sort_by(|a, b| a.y.partial_cmp(&b.y).unwrap());
    let avg_font_size = elements.iter().map(|e| e.font_size).sum::<f64>() / elements.len() as f64;
    let tau = adaptive_tau(&sorted, avg_font_size);

    let mut boundaries = Vec::new();
    let mut group_ys = vec![sorted[0].y];
    for w in sorted.windows(2) {
        if vertical_overlap_ratio(w[0], w[1]) >= tau {
            group_ys.push(w[1].y);
        } else {
            boundaries.push(group_ys.iter().sum::<f64>() / group_ys.len() as f64);
            group_ys = vec![w[1].y];
        }
    }
    boundaries.push(group_ys.iter().sum::<f64>() / group_ys.len() as f64);
    boundaries
}

fn alignment_pass(elements: &[TextElement], alignment_tolerance: f64) -> Vec<f64> {
    let mut bottom_buckets: HashMap<i64, Vec<f64>> = HashMap::new();
    let mut top_buckets: HashMap<i64, Vec<f64>> = HashMap::new();
    for e in elements {
        bottom_buckets
            .entry((e.y / alignment_tolerance).round() as i64)
            .or_default()
            .push(e.y);
        top_buckets
            .entry((e.top() / alignment_tolerance).round() as i64)
            .or_default()
            .push(e.top());
    }
    bottom_buckets
        .values()
        .chain(top_buckets.values())
        .filter(|vals| vals.len() >= 3)
        .map(|vals| vals.iter().sum::<f64>() / vals.len() as f64)
        .collect()
}

struct StripStats {
    has_amount: bool,
    min_x: f64,
}

fn strip_stats(elements: &[TextElement], lo: f64, hi: f64) -> StripStats {
    let members: Vec<&TextElement> = elements.iter().filter(|e| e.y >= lo && e.y < hi).collect();
    if members.is_empty() {
        return StripStats {
            has_amount: false,
            min_x: f64::INFINITY,
        };
    }
    StripStats {
        has_amount: members.iter().any(|m| looks_like_amount(&m.text)),
        min_x: members.iter().map(|m| m.x).fold(f64::INFINITY, f64::min),
    }
}

fn looks_like_amount(text: &str) -> bool {
    let t = text.trim();
    if t.is_empty() {
        return false;
    }
    if t.chars().filter(|&c| c == '.').count() >= 2 {
        return false;
    }
    let mut chars = t.chars().peekable();
    if matches!(chars.peek(), Some('+') | Some('-')) {
        chars.next();
    }
    let mut separator_count = 0;
    let mut saw_digit = false;
    for c in chars {
        match c {
            '0'..='9' => saw_digit = true,
            ' ' | '\u{00A0}' => {}
            ',' | '.' => separator_count += 1,
            _ => return false,
        }
    }
    saw_digit && separator_count <= 2
}

/// Drop row boundaries that merely continue the previous strip: the gap to
/// the previous boundary is under `1.5·avg_font_size`, the strip itself
/// contains no amount-like text, and its leftmost element does not indent
/// more than 10pt past the previous strip's leftmost element. The first
/// and last boundary are always kept.
fn multiline_filter(boundaries: &[f64], elements: &[TextElement], avg_font_size: f64) -> Vec<f64> {
    let n = boundaries.len();
    if n <= 2 {
        return boundaries.to_vec();
    }
    let strips: Vec<StripStats> = boundaries.windows(2).map(|w| strip_stats(elements, w[0], w[1])).collect();

    let mut keep = vec![true; n];
    for i in 1..n {
        let strip = &strips[i - 1];
        let gap = boundaries[i] - boundaries[i - 1];
        let previous_min_x = if i >= 2 { strips[i - 2].min_x } else { f64::NEG_INFINITY };
        let is_continuation =
            gap < 1.5 * avg_font_size && !strip.has_amount && strip.min_x >= previous_min_x - 10.0;
        if is_continuation && i != n - 1 {
            keep[i] = false;
        }
    }
    boundaries.iter().zip(keep).filter_map(|(&b, k)| k.then_some(b)).collect()
}

/// Hybrid row-boundary detection: union the gap, overlap and alignment
/// passes, deduplicate, then drop boundaries that only split a multi-line
/// cell's wrapped continuation lines apart.
pub fn detect_rows(elements: &[TextElement], mode: TableDetectionMode, params: &RowParams) -> Vec<f64> {
    if elements.is_empty() {
        return Vec::new();
    }
    let avg_font_size = elements.iter().map(|e| e.font_size).sum::<f64>() / elements.len() as f64;

    let mut candidates = gap_pass(elements, mode, avg_font_size, params);
    candidates.extend(overlap_pass(elements));
    candidates.extend(alignment_pass(elements, params.alignment_tolerance));
    candidates.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let deduped = dedupe_within(&candidates, params.alignment_tolerance);
    multiline_filter(&deduped, elements, avg_font_size)
}

fn dedupe_within(sorted_values: &[f64], tolerance: f64) -> Vec<f64> {
    let mut out: Vec<f64> = Vec::new();
    for &v in sorted_values {
        if let Some(&last) = out.last() {
            if (v - last).abs() <= tolerance {
                continue;
            }
        }
        out.push(v);
    }
    out
}
