use ethers::{abi::Token, types::Address};
use eyre::OptionExt;
use futures::future::try_join_all;
use itertools::Itertools;

use crate::{
    context::{DeploymentContext, ACL_NAME, REGISTRY_NAME},
    facets::{deploy_facets, FacetSet},
    proxy::{ensure_proxy, ModuleId, ModuleSpec, ProxyRecord},
    registry::RegistryClient,
    roles::{setup_calls, ROLEGROUP_SYSTEM_ADMINS, ROLE_SYSTEM_ADMIN},
};

/// Make sure the access control contract exists.
///
/// Fresh runs deploy it and configure the role table, other runs take it from
/// the address manifest.
pub async fn ensure_acl(ctx: &mut DeploymentContext) -> eyre::Result<Address> {
    let logger = ctx.logger.clone();
    let acl = logger
        .task("acl", async {
            if !ctx.fresh {
                return Ok(ctx.manifest.address(ACL_NAME, ctx.chain_id())?);
            }

            let initcode = ctx.artifacts.initcode(
                ACL_NAME,
                &[
                    Token::FixedBytes(ROLE_SYSTEM_ADMIN.id().to_vec()),
                    Token::FixedBytes(ROLEGROUP_SYSTEM_ADMINS.id().to_vec()),
                ],
            )?;
            let acl = ctx.dispatcher.deploy(ACL_NAME, initcode).await?;

            let calls = setup_calls(acl);
            logger.info(ACL_NAME, format!("Configuring {} role entries", calls.len()));
            try_join_all(calls.into_iter().map(|call| ctx.dispatcher.execute(call))).await?;
            Ok::<_, eyre::Report>(acl)
        })
        .await?;

    ctx.acl = Some(acl);
    Ok(acl)
}

/// Make sure the settings registry exists, after the ACL.
pub async fn ensure_registry(ctx: &mut DeploymentContext) -> eyre::Result<RegistryClient> {
    let acl = ctx
        .acl
        .ok_or_eyre("Access control must be ensured before the registry")?;
    let logger = ctx.logger.clone();
    let address = logger
        .task("registry", async {
            if !ctx.fresh {
                return Ok(ctx.manifest.address(REGISTRY_NAME, ctx.chain_id())?);
            }
            let initcode = ctx
                .artifacts
                .initcode(REGISTRY_NAME, &[Token::Address(acl)])?;
            ctx.dispatcher.deploy(REGISTRY_NAME, initcode).await
        })
        .await?;

    let registry = RegistryClient::new(address, ctx.dispatcher.clone());
    ctx.registry = Some(registry.clone());
    Ok(registry)
}

pub async fn ensure_module(
    ctx: &mut DeploymentContext,
    module: ModuleId,
) -> eyre::Result<ProxyRecord> {
    let spec = module.spec();
    ensure_module_with(ctx, &spec, FacetSet::new(spec.facets.iter().copied())).await
}

/// Deploy `facets`, publish them under the module's facet list and point the
/// module's proxy at them.
pub async fn ensure_module_with(
    ctx: &mut DeploymentContext,
    spec: &ModuleSpec,
    facets: FacetSet,
) -> eyre::Result<ProxyRecord> {
    let registry = ctx
        .registry
        .clone()
        .ok_or_eyre("Registry must be ensured before any module")?;
    let logger = ctx.logger.clone();

    let record = logger
        .task(spec.name, async {
            logger.info(spec.name, format!("Facets: {}", facets.names().iter().join(", ")));
            let addresses =
                deploy_facets(&ctx.dispatcher, &ctx.artifacts, registry.address(), &facets).await?;
            registry
                .set_addresses(registry.address(), spec.facets_key, addresses.clone())
                .await?;
            ensure_proxy(
                &registry,
                &ctx.dispatcher,
                &ctx.artifacts,
                spec,
                addresses,
                &logger,
            )
            .await
        })
        .await?;

    ctx.modules.insert(spec.id, record.clone());
    Ok(record)
}

/// Whole run: access control, registry, then each of `modules` in order.
pub async fn run(ctx: &mut DeploymentContext, modules: &[ModuleId]) -> eyre::Result<()> {
    ensure_acl(ctx).await?;
    ensure_registry(ctx).await?;
    for module in modules {
        let record = ensure_module(ctx, *module).await?;
        ctx.logger.info(
            module.spec().name,
            format!("{:?} proxy at {:?}", record.outcome, record.proxy),
        );
    }
    Ok(())
}
