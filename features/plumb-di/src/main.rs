use futures::FutureExt;
use plumb_di::{
    ainject, inject, scan, Arguments, AsyncExitStack, AsyncGenerator, Callable, DynError, Exit,
    ExitStack, Generator, Instance, Parameter, Scope,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Session {
    database_url: String,
}

fn main() -> Result<(), DynError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let require_session = Callable::generator("require_session", |arguments: Arguments| {
        let database_url = arguments.get::<String>("database_url")?;
        let session = Session {
            database_url: database_url.to_string(),
        };
        tracing::info!("Session set-up for {}", session.database_url);
        Ok(Generator::new(Instance::new(session), |outcome| {
            match outcome.error() {
                Some(error) => tracing::info!("Session rollback after: {error}"),
                None => tracing::info!("Session clean-up"),
            }
            Ok(Exit::Propagate)
        }))
    })
    .param(Parameter::scope::<String>("database_url"))
    .returns::<Session>()
    .build();

    let intermediate = Callable::function("intermediate_dependency", |arguments: Arguments| {
        Ok(Instance::from_arc(arguments.get::<Session>("session")?))
    })
    .param(Parameter::from_dependency::<Session>("session", scan(&require_session)))
    .build();

    let application = Callable::function("application", |arguments: Arguments| {
        let session = arguments.get::<Session>("session")?;
        let session1 = arguments.get::<Session>("session1")?;
        tracing::info!(
            "Application started with {session:?}, shared: {}",
            std::sync::Arc::ptr_eq(&session, &session1)
        );
        Ok(Instance::unit())
    })
    .param(Parameter::from_dependency::<Session>("session", scan(&require_session)))
    .param(Parameter::from_dependency::<Session>("session1", scan(&intermediate)))
    .build();

    let scope = Scope::new().with("database_url", "postgresql://localhost:5432/app".to_string());

    ExitStack::run(|stack| inject(&scope, &scan(&application), stack, None, None))?;

    let require_lifespan = Callable::async_generator("require_lifespan", |_| async {
        tracing::info!("Lifespan started");
        Ok::<_, DynError>(AsyncGenerator::new(Instance::new("lifespan"), |_| {
            async {
                tracing::info!("Lifespan stopped");
                Ok(Exit::Propagate)
            }
            .boxed()
        }))
    })
    .build();

    let serve = Callable::async_function("serve", |arguments: Arguments| async move {
        let lifespan = arguments.get::<&'static str>("lifespan")?;
        tracing::info!("Serving within {lifespan}");
        Ok::<_, DynError>(Instance::unit())
    })
    .param(Parameter::from_dependency::<&'static str>("lifespan", scan(&require_lifespan)))
    .build();

    futures::executor::block_on(async {
        let mut stack = AsyncExitStack::new();
        let result = ainject(&scope, &scan(&serve), &mut stack, None, None).await;
        stack.exit(result).await
    })?;

    Ok(())
}
