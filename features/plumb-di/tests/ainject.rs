mod common;

use common::{events, record, recording_function, session_generator, Log, Session};
use futures::{executor::block_on, FutureExt};
use plumb_di::{
    ainject, inject, injection_trace, scan, scan_with, Arguments, AsyncContextManager,
    AsyncExitStack, AsyncGenerator, Callable, DynError, Exit, ExitStack, InjectErrorKind,
    InjectionCache, Instance, Outcome, Override, Parameter, ResolveError, Scope,
};
use rstest::rstest;

fn arun(scope: &Scope, callable: &Callable) -> Result<Option<Instance>, plumb_di::InjectError> {
    let info = scan(callable);
    block_on(async {
        let mut stack = AsyncExitStack::new();
        let result = ainject(scope, &info, &mut stack, None, None).await;
        stack.exit(result).await
    })
}

fn async_generator(name: &'static str, log: &Log, value: usize) -> Callable {
    let log = log.clone();
    Callable::async_generator(name, move |_| {
        let log = log.clone();
        async move {
            record(&log, format!("{name}:started"));
            let teardown_log = log.clone();
            Ok::<_, DynError>(AsyncGenerator::new(Instance::new(value), move |outcome| {
                let failed = outcome.is_failure();
                async move {
                    record(&teardown_log, format!("{name}:finished:{failed}"));
                    Ok(Exit::Propagate)
                }
                .boxed()
            }))
        }
    })
    .returns::<usize>()
    .build()
}

#[test]
fn injects_async_callables() {
    let dep = Callable::async_function("dep", |_| async { Ok::<_, DynError>(Instance::unit()) })
        .build();
    let func = Callable::async_function("func", |arguments: Arguments| async move {
        assert_eq!(*arguments.get::<i64>("arg")?, 1);
        assert_eq!(*arguments.get::<String>("arg1")?, "value");
        assert!(arguments.get::<()>("arg2").is_ok());
        Ok::<_, DynError>(Instance::new("result".to_string()))
    })
    .param(Parameter::scope::<i64>("arg"))
    .param(Parameter::scope::<String>("arg1"))
    .param(Parameter::from_dependency::<()>("arg2", scan(&dep)))
    .build();
    let scope = Scope::new().with("arg", 1_i64).with("arg1", "value".to_string());

    let result = arun(&scope, &func).unwrap().unwrap();

    assert_eq!(result.downcast_ref::<String>().unwrap(), "result");
}

#[test]
fn async_generator_is_finished_when_the_stack_exits() {
    let log = Log::default();
    let dep = async_generator("dep", &log, 111);
    let func_log = log.clone();
    let func = Callable::async_function("func", move |arguments: Arguments| {
        let log = func_log.clone();
        async move {
            let value = arguments.get::<usize>("arg2")?;
            record(&log, format!("func:{value}"));
            Ok::<_, DynError>(Instance::unit())
        }
    })
    .param(Parameter::from_dependency::<usize>("arg2", scan(&dep)))
    .build();
    let info = scan(&func);

    block_on(async {
        let mut stack = AsyncExitStack::new();
        ainject(&Scope::new(), &info, &mut stack, None, None)
            .await
            .unwrap();
        assert_eq!(events(&log), ["dep:started", "func:111"]);

        stack.close(None).await.unwrap();
    });

    assert_eq!(events(&log), ["dep:started", "func:111", "dep:finished:false"]);
}

#[test]
fn sync_dependencies_run_inline_in_async_injection() {
    let log = Log::default();
    let require_session = session_generator("require_session", &log).build();
    let lifespan = async_generator("lifespan", &log, 1);
    let application = Callable::function("application", |arguments: Arguments| {
        let session = arguments.instance("session").unwrap();
        let lifespan = arguments.get::<usize>("lifespan")?;
        Ok(Instance::new(session.is::<Session>() && *lifespan == 1))
    })
    .param(Parameter::from_dependency::<Session>("session", scan(&require_session)))
    .param(Parameter::from_dependency::<usize>("lifespan", scan(&lifespan)))
    .build();

    let result = arun(&Scope::new(), &application).unwrap().unwrap();

    assert!(*result.downcast_ref::<bool>().unwrap());
    assert_eq!(
        events(&log),
        [
            "require_session:set-up",
            "lifespan:started",
            "lifespan:finished:false",
            "require_session:clean-up"
        ]
    );
}

struct Connection {
    log: Log,
}
impl AsyncContextManager for Connection {
    type Provides = String;

    async fn enter(&mut self) -> Result<String, DynError> {
        record(&self.log, "connect");
        Ok("connection".to_string())
    }

    async fn exit(self, outcome: Outcome<'_>) -> Result<Exit, DynError> {
        if outcome.is_failure() {
            record(&self.log, "abort");
            return Ok(Exit::Suppress);
        }
        record(&self.log, "disconnect");
        Ok(Exit::Propagate)
    }
}

fn connection(log: &Log) -> Callable {
    let log = log.clone();
    Callable::async_context_manager("require_connection", move |_| {
        Ok(Connection { log: log.clone() })
    })
    .build()
}

#[test]
fn async_context_manager_is_entered_and_exited() {
    let log = Log::default();
    let require_connection = connection(&log);
    let application = Callable::function("application", |arguments: Arguments| {
        Ok(Instance::from_arc(arguments.get::<String>("connection")?))
    })
    .param(Parameter::from_dependency::<String>(
        "connection",
        scan(&require_connection),
    ))
    .build();

    let result = arun(&Scope::new(), &application).unwrap().unwrap();

    assert_eq!(result.downcast_ref::<String>().unwrap(), "connection");
    assert_eq!(events(&log), ["connect", "disconnect"]);
}

#[test]
fn async_context_manager_can_suppress_a_failure() {
    let log = Log::default();
    let require_connection = connection(&log);
    let application = Callable::async_function("application", |_| async {
        Err::<Instance, DynError>("query failed".into())
    })
    .param(Parameter::from_dependency::<String>(
        "connection",
        scan(&require_connection),
    ))
    .build();

    let result = arun(&Scope::new(), &application);

    assert!(matches!(result, Ok(None)));
    assert_eq!(events(&log), ["connect", "abort"]);
}

#[test]
fn sync_injection_rejects_async_dependencies() {
    let log = Log::default();
    let lifespan = async_generator("lifespan", &log, 1);
    let application = Callable::function("application", |_| Ok(Instance::unit()))
        .param(Parameter::from_dependency::<usize>("lifespan", scan(&lifespan)))
        .build();

    let error = ExitStack::run(|stack| {
        inject(&Scope::new(), &scan(&application), stack, None, None)
    })
    .unwrap_err();

    match error.kind() {
        InjectErrorKind::Resolve(ResolveError::InvalidDependencyShape { call }) => {
            assert_eq!(call, "lifespan")
        }
        other => panic!("unexpected error: {other}"),
    }
    let trace = injection_trace(&error).unwrap();
    let frames: Vec<_> = trace.frames().map(|frame| frame.info.name()).collect();
    assert_eq!(frames, ["application", "lifespan"]);
    assert!(trace.innermost().values.is_empty());
    assert!(events(&log).is_empty());
}

#[test]
fn sync_injection_rejects_an_async_root() {
    let application = Callable::async_function("application", |_| async {
        Ok::<_, DynError>(Instance::unit())
    })
    .build();

    let error = ExitStack::run(|stack| {
        inject(&Scope::new(), &scan(&application), stack, None, None)
    })
    .unwrap_err();

    assert!(matches!(
        error.kind(),
        InjectErrorKind::Resolve(ResolveError::InvalidDependencyShape { .. })
    ));
    assert_eq!(error.trace().unwrap().depth(), 1);
}

#[rstest]
#[case::cached(true, 1)]
#[case::uncached(false, 2)]
fn async_diamond_follows_caching(#[case] caching: bool, #[case] lifespans: usize) {
    let log = Log::default();
    let lifespan = async_generator("lifespan", &log, 1);
    let intermediate = Callable::async_function("intermediate", |arguments: Arguments| async move {
        Ok::<_, DynError>(Instance::from_arc(arguments.get::<usize>("lifespan")?))
    })
    .param(Parameter::from_dependency::<usize>(
        "lifespan",
        scan_with(&lifespan, caching),
    ))
    .build();
    let application = Callable::async_function("application", |arguments: Arguments| async move {
        let direct = arguments.instance("direct").cloned().unwrap();
        let nested = arguments.instance("nested").cloned().unwrap();
        Ok::<_, DynError>(Instance::new(Instance::same(&direct, &nested)))
    })
    .param(Parameter::from_dependency::<usize>("direct", scan(&lifespan)))
    .param(Parameter::from_dependency::<usize>("nested", scan(&intermediate)))
    .build();

    let result = arun(&Scope::new(), &application).unwrap().unwrap();

    assert_eq!(*result.downcast_ref::<bool>().unwrap(), caching);
    let started = events(&log).iter().filter(|event| event.ends_with("started")).count();
    let finished = events(&log).iter().filter(|event| event.contains("finished")).count();
    assert_eq!(started, lifespans);
    assert_eq!(finished, lifespans);
}

#[test]
fn async_overrides_replace_values_and_descriptors() {
    let log = Log::default();
    let require_user = recording_function("require_user", &log, "user").build();
    let require_token = recording_function("require_token", &log, "token").build();
    let fake_token = Callable::async_function("fake_token", |_| async {
        Ok::<_, DynError>(Instance::new("fake".to_string()))
    })
    .build();
    let application = Callable::async_function("application", |arguments: Arguments| async move {
        let user = arguments.get::<String>("user")?;
        let token = arguments.get::<String>("token")?;
        Ok::<_, DynError>(Instance::new(format!("{user}/{token}")))
    })
    .param(Parameter::from_dependency::<String>("user", scan(&require_user)))
    .param(Parameter::from_dependency::<String>("token", scan(&require_token)))
    .build();
    let overrides = Override::new()
        .value(&require_user, "test_user".to_string())
        .dependency(&require_token, scan(&fake_token));
    let mut cache = InjectionCache::new();

    let result = block_on(async {
        let mut stack = AsyncExitStack::new();
        let result = ainject(
            &Scope::new(),
            &scan(&application),
            &mut stack,
            Some(&mut cache),
            Some(&overrides),
        )
        .await;
        stack.exit(result).await
    })
    .unwrap()
    .unwrap();

    assert_eq!(result.downcast_ref::<String>().unwrap(), "test_user/fake");
    assert!(events(&log).is_empty());
    assert!(cache.contains(&fake_token));
    assert!(!cache.contains(&require_token));
}

#[test]
fn async_resources_observe_a_failure() {
    let log = Log::default();
    let lifespan = async_generator("lifespan", &log, 1);
    let require_animal = Callable::async_function("require_random_animal", |_| async {
        Err::<Instance, DynError>("Failed to connect to server".into())
    })
    .build();
    let application = Callable::function("application", |_| Ok(Instance::unit()))
        .param(Parameter::from_dependency::<usize>("lifespan", scan(&lifespan)))
        .param(Parameter::from_dependency::<String>("animal", scan(&require_animal)))
        .build();

    let error = arun(&Scope::new(), &application).unwrap_err();

    assert_eq!(error.to_string(), "Failed to connect to server");
    assert_eq!(events(&log), ["lifespan:started", "lifespan:finished:true"]);
}

#[test]
fn async_failure_trace_lists_every_frame() {
    let failing = Callable::async_function("require_random_animal", |_| async {
        Err::<Instance, DynError>("Failed to connect to server".into())
    })
    .build();
    let require_user = Callable::function("require_user", |_| Ok(Instance::unit()))
        .param(Parameter::scope::<u32>("retries").with_default(3_u32))
        .param(Parameter::from_dependency::<String>("animal", scan(&failing)))
        .build();
    let application = Callable::async_function("application", |_| async {
        Ok::<_, DynError>(Instance::unit())
    })
    .param(Parameter::from_dependency::<()>("user", scan(&require_user)))
    .build();

    let error = arun(&Scope::new(), &application).unwrap_err();

    let trace = injection_trace(&error).unwrap();
    let frames: Vec<_> = trace.frames().map(|frame| frame.info.name()).collect();
    assert_eq!(frames, ["application", "require_user", "require_random_animal"]);
    let values: Vec<Vec<&str>> = trace
        .frames()
        .map(|frame| frame.values.keys().map(String::as_str).collect())
        .collect();
    assert_eq!(values, [vec![], vec!["retries"], vec![]]);
}

#[test]
fn unclosed_async_stack_only_releases_sync_resources() {
    let log = Log::default();
    let require_session = session_generator("require_session", &log).build();
    let lifespan = async_generator("lifespan", &log, 1);
    let application = Callable::function("application", |_| Ok(Instance::unit()))
        .param(Parameter::from_dependency::<Session>("session", scan(&require_session)))
        .param(Parameter::from_dependency::<usize>("lifespan", scan(&lifespan)))
        .build();
    let info = scan(&application);

    block_on(async {
        let mut stack = AsyncExitStack::new();
        ainject(&Scope::new(), &info, &mut stack, None, None)
            .await
            .unwrap();
        assert_eq!(stack.len(), 2);
    });

    assert_eq!(
        events(&log),
        [
            "require_session:set-up",
            "lifespan:started",
            "require_session:clean-up"
        ]
    );
}

#[test]
fn unclosed_async_stack_forwards_a_failed_injection() {
    let log = Log::default();
    let require_session = session_generator("require_session", &log).build();
    let application = Callable::async_function("application", |_| async {
        Err::<Instance, DynError>("boom".into())
    })
    .param(Parameter::from_dependency::<Session>("session", scan(&require_session)))
    .build();
    let info = scan(&application);

    block_on(async {
        let mut stack = AsyncExitStack::new();
        let result = ainject(&Scope::new(), &info, &mut stack, None, None).await;
        assert!(result.is_err());
    });

    assert_eq!(
        events(&log),
        ["require_session:set-up", "require_session:clean-up:failure"]
    );
}
