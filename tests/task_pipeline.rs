use serde_json::{json, Map, Value};

use surge::remote::RecordingShell;
use surge::report::Reporter;
use surge::settings::{resolve, BoolSelection, DeployDefaults, ResolvedSettings};
use surge::task::{
    Args, ExecutionContext, Hook, HookFlow, Require, SkipIfNot, Task, TaskInvocation,
    TaskOutcome, TaskRegistry,
};
use surge::Result;

fn settings(extra: Value) -> ResolvedSettings {
    let mut declared = json!({"host": "h", "user": "u", "group": "g", "deploy_path": "/srv/app"})
        .as_object()
        .cloned()
        .unwrap();
    declared.extend(extra.as_object().cloned().unwrap());
    resolve(&DeployDefaults::default().to_settings(), &declared, &Map::new()).unwrap()
}

fn answer(_: &mut ExecutionContext<'_>, args: &Args) -> Result<Value> {
    Ok(json!({"answer": 42, "args": Value::Object(args.clone())}))
}

fn chain(ctx: &mut ExecutionContext<'_>, _: &Args) -> Result<Value> {
    let step = ctx.call("chained_only")?;
    Ok(json!({"skipped": step.is_skipped()}))
}

fn registry() -> TaskRegistry {
    let mut registry = TaskRegistry::new();
    registry
        .register(
            Task::new("strict", answer)
                .with_standard_hooks(BoolSelection::None)
                .hook(Require::hard("blah", "blarg")),
        )
        .unwrap();
    registry
        .register(
            Task::new("lenient", answer)
                .params(["flag"])
                .with_standard_hooks(BoolSelection::only(["flag"]))
                .hook(Require::soft("flag", true)),
        )
        .unwrap();
    registry
        .register(
            Task::new("chained_only", answer)
                .with_standard_hooks(BoolSelection::None)
                .hook(SkipIfNot::new("restart_nginx", true)),
        )
        .unwrap();
    registry
        .register(Task::new("chain", chain).composite().with_standard_hooks(BoolSelection::None))
        .unwrap();
    registry
}

#[test]
fn hard_requirement_passes_the_result_through_on_match() {
    let shell = RecordingShell::new("h");
    let registry = registry();
    let mut ctx = ExecutionContext::new(
        settings(json!({"blah": "blarg"})),
        &shell,
        &shell,
        &registry,
        Reporter::captured(),
    );

    let outcome = ctx.invoke("strict", Map::new()).unwrap();
    assert_eq!(outcome.value().unwrap()["answer"], 42);
}

#[test]
fn hard_requirement_fails_with_exact_values() {
    let shell = RecordingShell::new("h");
    let registry = registry();
    let mut ctx = ExecutionContext::new(
        settings(json!({"blah": "blam"})),
        &shell,
        &shell,
        &registry,
        Reporter::captured(),
    );

    let err = ctx.invoke("strict", Map::new()).unwrap_err();
    assert_eq!(err.code.as_str(), "task.requirement_missed");
    assert_eq!(err.details["setting"], "blah");
    assert_eq!(err.details["expected"], "blarg");
    assert_eq!(err.details["actual"], "blam");
}

#[test]
fn soft_requirement_skips_and_notifies_at_the_entry_point() {
    let shell = RecordingShell::new("h");
    let registry = registry();
    let mut ctx = ExecutionContext::new(settings(json!({})), &shell, &shell, &registry, Reporter::captured());

    let outcome = ctx.invoke("lenient", Map::new()).unwrap();
    assert!(matches!(outcome, TaskOutcome::Skipped { .. }));
    assert!(ctx.reporter.contains("lenient skipped: FLAG is not true"));
}

#[test]
fn explicit_arguments_satisfy_a_soft_requirement() {
    let shell = RecordingShell::new("h");
    let registry = registry();
    let mut ctx = ExecutionContext::new(settings(json!({})), &shell, &shell, &registry, Reporter::captured());

    let mut args = Map::new();
    args.insert("flag".to_string(), json!("YES"));
    let outcome = ctx.invoke("lenient", args).unwrap();

    assert_eq!(outcome.value().unwrap()["args"]["flag"], json!(true));
}

#[test]
fn soft_requirement_demands_a_tag() {
    let shell = RecordingShell::new("h");
    let registry = registry();
    let mut ctx = ExecutionContext::new(settings(json!({})), &shell, &shell, &registry, Reporter::captured());

    let task = Task::new("bare", answer);
    let mut invocation = TaskInvocation {
        task: "bare".to_string(),
        args: Map::new(),
    };
    let err = Require::soft("flag", true)
        .apply(&mut ctx, &task, &mut invocation)
        .unwrap_err();
    assert_eq!(err.code.as_str(), "task.untagged");
}

#[test]
fn skip_if_not_only_applies_inside_a_chain() {
    let shell = RecordingShell::new("h");
    let registry = registry();

    let mut direct =
        ExecutionContext::new(settings(json!({})), &shell, &shell, &registry, Reporter::captured());
    assert!(!direct.invoke("chained_only", Map::new()).unwrap().is_skipped());

    let mut chained =
        ExecutionContext::new(settings(json!({})), &shell, &shell, &registry, Reporter::captured());
    let outcome = chained.invoke("chain", Map::new()).unwrap();
    assert_eq!(outcome.value().unwrap()["skipped"], true);
}

#[test]
fn composite_arguments_become_overrides_for_the_chain() {
    let shell = RecordingShell::new("h");
    let registry = registry();
    let mut ctx = ExecutionContext::new(settings(json!({})), &shell, &shell, &registry, Reporter::captured());

    let mut args = Map::new();
    args.insert("restart_nginx".to_string(), json!("true"));
    let outcome = ctx.invoke("chain", args).unwrap();

    assert_eq!(outcome.value().unwrap()["skipped"], false);
    assert_eq!(ctx.settings.get("restart_nginx"), Some(&json!(false)));
}

#[test]
fn back_to_back_runs_start_from_a_clean_context() {
    let shell = RecordingShell::new("h");
    let registry = registry();
    let mut ctx = ExecutionContext::new(settings(json!({})), &shell, &shell, &registry, Reporter::captured());

    ctx.invoke("chain", args_of(json!({"restart_nginx": "true"}))).unwrap();
    assert_eq!(ctx.called_task, None);

    // Direct run: no chain, so skip_if_not does not apply.
    assert!(!ctx.invoke("chained_only", Map::new()).unwrap().is_skipped());

    // A fresh chain no longer sees the earlier explicit override.
    let outcome = ctx.invoke("chain", Map::new()).unwrap();
    assert_eq!(outcome.value().unwrap()["skipped"], true);

    ctx.invoke("lenient", Map::new()).unwrap();
    ctx.invoke("lenient", Map::new()).unwrap();
    let notices = ctx
        .reporter
        .lines()
        .iter()
        .filter(|l| l.text.contains("lenient skipped"))
        .count();
    assert_eq!(notices, 2);
    let shown = ctx
        .reporter
        .lines()
        .iter()
        .filter(|l| l.text.starts_with("deploy_path = "))
        .count();
    assert_eq!(shown, 5);
}

fn args_of(v: Value) -> Args {
    v.as_object().cloned().unwrap()
}

#[test]
fn hooks_can_be_user_defined() {
    struct Never;

    impl Hook for Never {
        fn name(&self) -> &'static str {
            "never"
        }

        fn apply(
            &self,
            _ctx: &mut ExecutionContext<'_>,
            task: &Task,
            _invocation: &mut TaskInvocation,
        ) -> Result<HookFlow> {
            Ok(HookFlow::Skip(format!("{} never runs", task.name)))
        }
    }

    let mut registry = TaskRegistry::new();
    registry
        .register(Task::new("nope", answer).hook(Never))
        .unwrap();
    let shell = RecordingShell::new("h");
    let mut ctx = ExecutionContext::new(settings(json!({})), &shell, &shell, &registry, Reporter::captured());

    assert_eq!(
        ctx.invoke("nope", Map::new()).unwrap(),
        TaskOutcome::Skipped {
            reason: "nope never runs".to_string()
        }
    );
    assert_eq!(registry.summaries()[0].hooks, vec!["never"]);
}
