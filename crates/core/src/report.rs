//! Grouping, tallies and the textual pass/fail report.

use crate::benchmark::BenchmarkReport;
use crate::config::Services;
use crate::probe::ProbeResult;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceGroup {
    Server,
    Embedding,
    Database,
    Connectivity,
}

impl ServiceGroup {
    pub const ALL: [ServiceGroup; 4] = [
        ServiceGroup::Server,
        ServiceGroup::Embedding,
        ServiceGroup::Database,
        ServiceGroup::Connectivity,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ServiceGroup::Server => "vLLM Server",
            ServiceGroup::Embedding => "vLLM Embedding",
            ServiceGroup::Database => "Weaviate",
            ServiceGroup::Connectivity => "Connectivity",
        }
    }

    /// Connectivity probes are recognised by description, everything else by
    /// the service base URL its target lives under. Each record lands in at
    /// most one group.
    pub fn classify(result: &ProbeResult, services: &Services) -> Option<Self> {
        if result.description.contains("Connectivity") {
            return Some(ServiceGroup::Connectivity);
        }
        [
            (ServiceGroup::Server, &services.server.base_url),
            (ServiceGroup::Embedding, &services.embedding.base_url),
            (ServiceGroup::Database, &services.database.base_url),
        ]
        .into_iter()
        .find(|(_, base)| under_base(&result.url, base))
        .map(|(group, _)| group)
    }
}

fn under_base(url: &str, base: &str) -> bool {
    let base = base.trim_end_matches('/');
    url == base
        || url
            .strip_prefix(base)
            .map(|rest| rest.starts_with('/'))
            .unwrap_or(false)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub passed: usize,
    pub total: usize,
}

impl Tally {
    pub fn of<'a>(results: impl IntoIterator<Item = &'a ProbeResult>) -> Self {
        results.into_iter().fold(Tally::default(), |mut t, r| {
            t.total += 1;
            if r.success {
                t.passed += 1;
            }
            t
        })
    }

    pub fn failed(&self) -> usize {
        self.total - self.passed
    }

    /// Percentage of passing probes; an empty tally is 0%.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.passed as f64 / self.total as f64 * 100.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    AllPassed,
    MostlyPassed,
    ManyFailed,
}

impl Verdict {
    pub fn of(tally: &Tally) -> Self {
        if tally.passed == tally.total {
            Verdict::AllPassed
        } else if tally.success_rate() >= 80.0 {
            Verdict::MostlyPassed
        } else {
            Verdict::ManyFailed
        }
    }
}

pub struct Report<'a> {
    pub results: &'a [ProbeResult],
    pub benchmark: Option<&'a BenchmarkReport>,
    pub services: &'a Services,
    pub verbose: bool,
}

impl<'a> Report<'a> {
    pub fn group(&self, group: ServiceGroup) -> Vec<&'a ProbeResult> {
        self.results
            .iter()
            .filter(|r| ServiceGroup::classify(r, self.services) == Some(group))
            .collect()
    }

    pub fn overall(&self) -> Tally {
        Tally::of(self.results)
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "\n{}", "=".repeat(80))?;
        writeln!(out, "📊 COMPREHENSIVE vLLM ENDPOINT TEST REPORT")?;
        writeln!(out, "{}", "=".repeat(80))?;

        for group in ServiceGroup::ALL {
            let results = self.group(group);
            if results.is_empty() {
                continue;
            }
            self.write_group(out, group, &results)?;
        }

        if let Some(bench) = self.benchmark {
            writeln!(out, "\n🚀 Performance Benchmark:")?;
            for (name, sample) in bench.samples() {
                if sample.success {
                    writeln!(
                        out,
                        "  ✅ {}: {:.2}s, {:.1} docs/s",
                        name, sample.elapsed, sample.throughput
                    )?;
                } else {
                    writeln!(out, "  ❌ {}: Failed", name)?;
                }
            }
        }

        let overall = self.overall();
        writeln!(out, "\n🎯 OVERALL RESULTS:")?;
        writeln!(out, "   Total Tests: {}", overall.total)?;
        writeln!(out, "   Passed: {}", overall.passed)?;
        writeln!(out, "   Failed: {}", overall.failed())?;
        writeln!(out, "   Success Rate: {:.1}%", overall.success_rate())?;

        let verdict = Verdict::of(&overall);
        match verdict {
            Verdict::AllPassed => writeln!(
                out,
                "\n🎉 ALL TESTS PASSED! Your vLLM deployment is fully functional!"
            )?,
            Verdict::MostlyPassed => writeln!(
                out,
                "\n✅ Most tests passed! Your deployment is mostly working."
            )?,
            Verdict::ManyFailed => writeln!(
                out,
                "\n⚠️  Many tests failed. Please check your service configuration."
            )?,
        }

        writeln!(out, "\n💡 RECOMMENDATIONS:")?;
        if verdict == Verdict::AllPassed {
            writeln!(out, "   - Your deployment is ready for production use")?;
            writeln!(
                out,
                "   - Consider setting up monitoring for continued health checks"
            )?;
        } else {
            writeln!(out, "   - Check failed services and their logs")?;
            writeln!(out, "   - Ensure all containers are running: docker-compose ps")?;
            writeln!(out, "   - Check network connectivity between services")?;
        }
        Ok(())
    }

    fn write_group<W: Write>(
        &self,
        out: &mut W,
        group: ServiceGroup,
        results: &[&ProbeResult],
    ) -> io::Result<()> {
        let tally = Tally::of(results.iter().copied());
        writeln!(out, "\n{}:", group.title())?;
        writeln!(
            out,
            "  Tests: {}/{} passed ({:.1}%)",
            tally.passed,
            tally.total,
            tally.success_rate()
        )?;

        let failed: Vec<_> = results.iter().filter(|r| !r.success).collect();
        if !failed.is_empty() {
            writeln!(out, "  Failed tests:")?;
            for f in failed {
                let reason = f
                    .error
                    .clone()
                    .unwrap_or_else(|| format!("Status {}", f.status_code));
                writeln!(out, "    ❌ {}: {}", f.description, reason)?;
            }
        }

        if self.verbose {
            let passed: Vec<_> = results.iter().filter(|r| r.success).collect();
            if !passed.is_empty() {
                writeln!(out, "  Successful tests:")?;
                for s in passed {
                    writeln!(out, "    ✅ {}: {}", s.description, s.status_code)?;
                }
            }
        }
        Ok(())
    }
}
