use std::{fmt, io};

use serde::Serialize;

use crate::{
    cache::{AccessResult, Cache},
    geometry::Geometry,
    trace::{Access, Operation},
};

/// hit/miss/eviction totals of one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub hits: usize,
    pub misses: usize,
    pub evictions: usize,
}

impl Summary {
    fn record(&mut self, result: AccessResult) {
        match result {
            AccessResult::Hit => self.hits += 1,
            AccessResult::Miss => self.misses += 1,
            AccessResult::MissEviction => {
                self.misses += 1;
                self.evictions += 1;
            }
        }
    }
    /// number of simulated cache accesses.
    pub fn accesses(&self) -> usize {
        self.hits + self.misses
    }
    /// writes `<hits> <misses> <evictions>`, the format graders read back.
    pub fn write_results(&self, mut w: impl io::Write) -> io::Result<()> {
        writeln!(w, "{} {} {}", self.hits, self.misses, self.evictions)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hits:{} misses:{} evictions:{}",
            self.hits, self.misses, self.evictions
        )
    }
}

/// outcome of feeding one trace record to the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub access: Access,
    results: [Option<AccessResult>; 2],
}

impl Step {
    /// cache access results in order; empty for instruction fetches.
    pub fn results(&self) -> impl Iterator<Item = AccessResult> + '_ {
        self.results.iter().flatten().copied()
    }
    pub fn is_skipped(&self) -> bool {
        self.results[0].is_none()
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.access)?;
        for r in self.results() {
            write!(f, " {r}")?;
        }
        Ok(())
    }
}

/// drives a [`Cache`] with trace records and keeps the counters.
pub struct Simulator {
    cache: Cache,
    summary: Summary,
    records: usize,
    #[cfg(feature = "stat")]
    stat_builder: stat::SimStatBuilder,
}

impl Simulator {
    pub fn new(geometry: Geometry) -> Self {
        log::debug!("cache allocated: {geometry}, {} bytes", geometry.capacity());
        Self {
            cache: Cache::new(geometry),
            summary: Summary::default(),
            records: 0,
            #[cfg(feature = "stat")]
            stat_builder: stat::SimStatBuilder::new(),
        }
    }
    pub fn geometry(&self) -> Geometry {
        self.cache.geometry()
    }
    pub fn cache(&self) -> &Cache {
        &self.cache
    }
    pub fn summary(&self) -> Summary {
        self.summary
    }
    /// number of load/store/modify records simulated so far.
    pub fn records(&self) -> usize {
        self.records
    }
    pub fn step(&mut self, access: &Access) -> Step {
        let passes = match access.op {
            Operation::Instruction => 0,
            Operation::Load | Operation::Store => 1,
            // the load leaves the block resident, so the store always hits
            Operation::Modify => 2,
        };
        let mut results = [None; 2];
        if passes > 0 {
            let d = self.cache.geometry().decode(access.addr);
            for slot in results.iter_mut().take(passes) {
                let r = self.cache.access(d.set, d.tag);
                self.summary.record(r);
                *slot = Some(r);
            }
            self.records += 1;
        }
        let step = Step {
            access: *access,
            results,
        };
        log::trace!("{step}");
        step
    }
    pub fn run<'a>(&mut self, accesses: impl IntoIterator<Item = &'a Access>) -> Summary {
        for access in accesses {
            self.step(access);
        }
        #[cfg(feature = "stat")]
        self.stat_builder.stop_timer();
        self.summary
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "stat")] {
        use crate::stat::Stats;

        impl Simulator {
            pub fn collect_stat(&self) -> Stats {
                let mut ss = Stats::default();
                ss.push(Box::new(self.stat_builder.finish(self.records)));
                ss.push(Box::new(self.summary));
                ss
            }
        }
    }
}

#[cfg(feature = "stat")]
mod stat {
    use crate::stat::*;

    use super::*;
    use std::time;

    pub struct SimStatBuilder {
        begin: time::Instant,
        elapsed: Option<time::Duration>,
    }

    impl SimStatBuilder {
        pub fn new() -> Self {
            Self {
                begin: time::Instant::now(),
                elapsed: None,
            }
        }
        pub fn stop_timer(&mut self) {
            self.elapsed = Some(time::Instant::now() - self.begin)
        }
        pub fn finish(&self, records: usize) -> SimStat {
            SimStat {
                records,
                elapsed: self
                    .elapsed
                    .unwrap_or_else(|| time::Instant::now() - self.begin),
            }
        }
    }

    impl Default for SimStatBuilder {
        fn default() -> Self {
            Self::new()
        }
    }

    pub struct SimStat {
        records: usize,
        elapsed: time::Duration,
    }

    impl Stat for SimStat {
        fn view(&self, _: usize) -> Box<dyn StatView + '_> {
            Box::new(self)
        }
    }

    impl StatView for &'_ SimStat {
        fn header(&self) -> &'static str {
            "simulator stat"
        }
        fn width(&self) -> usize {
            33
        }
    }

    impl fmt::Display for &'_ SimStat {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let ms = format!("{} ms", self.elapsed.as_millis());
            writeln!(f, "  elapsed total: {ms:>9}")?;
            let records = format!("#{}", self.records);
            writeln!(f, "  records total: {records:>9}")
        }
    }

    impl Stat for Summary {
        fn view(&self, _: usize) -> Box<dyn StatView + '_> {
            Box::new(CacheStatView::new(self))
        }
    }

    pub struct CacheStatView<'a> {
        stat: &'a Summary,
    }

    impl<'a> CacheStatView<'a> {
        pub fn new(stat: &'a Summary) -> Self {
            Self { stat }
        }
    }

    impl StatView for CacheStatView<'_> {
        fn header(&self) -> &'static str {
            "cache stat"
        }
        fn width(&self) -> usize {
            33
        }
    }

    impl fmt::Display for CacheStatView<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let hit = self.stat.hits;
            let miss = self.stat.misses;
            let evict = self.stat.evictions;
            let hit_pct = percentage(hit, hit + miss);
            let miss_pct = percentage(miss, hit + miss);
            let evict_pct = percentage(evict, miss);
            writeln!(f, "       hit: {hit:>10} ({hit_pct:>8}%)")?;
            writeln!(f, "      miss: {miss:>10} ({miss_pct:>8}%)")?;
            writeln!(f, "  eviction: {evict:>10} ({evict_pct:>8}%)")
        }
    }
}
