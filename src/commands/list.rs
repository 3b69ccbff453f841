use surge::deploy;
use surge::report::{Reporter, Tone};
use surge::task::TaskSummary;

use super::CmdResult;

pub fn run() -> CmdResult<Vec<TaskSummary>> {
    let registry = deploy::namespace()?;
    Ok((registry.summaries(), 0))
}

/// One line per task: name, aliases, help.
pub fn render(summaries: &[TaskSummary], reporter: &mut Reporter) {
    reporter.heading("Available tasks:");
    let width = summaries.iter().map(|s| s.name.len()).max().unwrap_or(0);

    for summary in summaries {
        let name = format!("  {:width$}", summary.name, width = width);
        let mut help = summary.help.clone();
        if !summary.aliases.is_empty() {
            help = format!("{} (aliases: {})", help, summary.aliases.join(", "));
        }
        if summary.is_default {
            reporter.segments(&[(Tone::Success, &name), (Tone::Plain, &help), (Tone::Accent, "[default]")]);
        } else {
            reporter.segments(&[(Tone::Success, &name), (Tone::Plain, &help)]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_marks_the_default_task() {
        let (summaries, code) = run().unwrap();
        assert_eq!(code, 0);

        let mut reporter = Reporter::captured();
        render(&summaries, &mut reporter);
        let default_line = reporter
            .lines()
            .iter()
            .find(|l| l.text.contains("[default]"))
            .unwrap();
        assert!(default_line.text.contains("full_deploy"));
        assert!(reporter.contains("aliases: extra-full-deploy, xfull-deploy"));
    }
}
