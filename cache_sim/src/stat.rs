//! Framed statistics tables printed after a run.

use std::fmt;

/// something that can render itself as a statistics block.
pub trait Stat {
    fn view(&self, max_width: usize) -> Box<dyn StatView + '_>;
}

/// one titled block; `Display` writes its body lines.
pub trait StatView: fmt::Display {
    fn header(&self) -> &'static str;
    /// widest body line
    fn width(&self) -> usize;
}

#[derive(Default)]
pub struct Stats {
    stats: Vec<Box<dyn Stat>>,
}

impl Stats {
    pub fn push(&mut self, stat: Box<dyn Stat>) {
        self.stats.push(stat)
    }
    pub fn view(&self, max_width: usize) -> StatsView<'_> {
        StatsView {
            views: self.stats.iter().map(|s| s.view(max_width)).collect(),
        }
    }
}

pub struct StatsView<'s> {
    views: Vec<Box<dyn StatView + 's>>,
}

impl fmt::Display for StatsView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .views
            .iter()
            .map(|v| v.header().len().max(v.width()))
            .fold(0, usize::max);
        writeln!(f, "{:-^width$}", " statistics ")?;
        for v in &self.views {
            writeln!(f, "{}:", v.header())?;
            write!(f, "{v}")?;
        }
        write!(f, "{:-<width$}", "")
    }
}

/// percentage of `part` in `total`, formatted for the stat tables.
pub(crate) fn percentage(part: usize, total: usize) -> String {
    let pct = if total == 0 {
        0.
    } else {
        100. * part as f64 / total as f64
    };
    format!("{pct:.6}")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    impl Stat for Fixed {
        fn view(&self, _: usize) -> Box<dyn StatView + '_> {
            Box::new(FixedView)
        }
    }

    struct FixedView;

    impl StatView for FixedView {
        fn header(&self) -> &'static str {
            "fixed"
        }
        fn width(&self) -> usize {
            20
        }
    }

    impl fmt::Display for FixedView {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            writeln!(f, "  body")
        }
    }

    #[test]
    fn test_view_frames_every_stat() {
        let mut ss = Stats::default();
        ss.push(Box::new(Fixed));
        ss.push(Box::new(Fixed));
        let out = ss.view(80).to_string();
        assert_eq!(
            out,
            format!(
                "{:-^20}\nfixed:\n  body\nfixed:\n  body\n{}",
                " statistics ",
                "-".repeat(20)
            )
        );
    }
    #[test]
    fn test_empty_stats() {
        let out = Stats::default().view(80).to_string();
        assert_eq!(out, " statistics \n");
    }
    #[test]
    fn test_percentage() {
        assert_eq!(percentage(1, 4), "25.000000");
        assert_eq!(percentage(0, 0), "0.000000");
    }
}
