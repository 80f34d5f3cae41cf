use std::sync::Arc;

use gridkernel::{
    gate_task, reserved, scene_driver_task, AppConfig, App, Database, DenseColumn, DenseRow, FullSchema, MappingSlotId, Module, Pinning, SceneGate, SceneState, SchedulerConfig, SharedColumn,
    SharedRow, SparseColumn, TableId, TaskArgs, TaskBuilder,
};

#[derive(Clone, Copy, Default)]
struct Position {
    x: f32,
    y: f32,
}
impl DenseRow for Position {}

#[derive(Clone, Copy, Default)]
struct Velocity {
    dy: f32,
}
impl DenseRow for Velocity {}

#[derive(Clone, Copy, Default)]
struct SpawnBudget {
    remaining: u32,
}
impl SharedRow for SpawnBudget {}

const GRAVITY: f32 = -9.8;
const GROUND_Y: f32 = 0.0;

struct ParticlesModule {
    particles: std::sync::OnceLock<TableId>,
    graveyard: std::sync::OnceLock<TableId>,
    gate: Arc<SceneGate>,
}

impl ParticlesModule {
    fn new() -> Self {
        Self {
            particles: std::sync::OnceLock::new(),
            graveyard: std::sync::OnceLock::new(),
            gate: SceneGate::new(1),
        }
    }
}

impl Module for ParticlesModule {
    fn create_database(&self, db: &mut Database) {
        let particles = db.add_table();
        particles.declare_row(reserved::stable_id_row(), Box::new(DenseColumn::<MappingSlotId>::new()));
        particles.declare_row(reserved::event_row(), Box::new(SparseColumn::<gridkernel::EventFlags>::new()));
        particles.declare_row(reserved::move_target_row(), Box::new(SparseColumn::<TableId>::new()));
        particles.declare_row(Position::row_type_id(), Box::new(DenseColumn::<Position>::new()));
        particles.declare_row(Velocity::row_type_id(), Box::new(DenseColumn::<Velocity>::new()));
        particles.declare_row(SpawnBudget::row_type_id(), Box::new(SharedColumn::new(SpawnBudget { remaining: 20 })));
        let particles_id = particles.table_id();
        self.particles.set(particles_id).ok();

        let graveyard = db.add_table();
        graveyard.declare_row(reserved::stable_id_row(), Box::new(DenseColumn::<MappingSlotId>::new()));
        graveyard.declare_row(Position::row_type_id(), Box::new(DenseColumn::<Position>::new()));
        let graveyard_id = graveyard.table_id();
        self.graveyard.set(graveyard_id).ok();
    }

    fn init_scheduler(&self, db: &gridkernel::Database) -> Vec<gridkernel::AppTask> {
        let particles = *self.particles.get().unwrap();
        let graveyard = *self.graveyard.get().unwrap();

        let mut spawn = TaskBuilder::new(db);
        let spawn_modifier = spawn.get_modifier_for_table(particles);
        let budget = spawn.shared_query::<SpawnBudget>(true);
        spawn.set_name("spawn_particle");
        spawn.set_pinning(Pinning::Main);
        spawn.set_callback(move |args: &TaskArgs| {
            let Some(b) = budget.get_mut(args.main, particles) else { return };
            if b.remaining == 0 {
                return;
            }
            b.remaining -= 1;
            spawn_modifier.add_elements(args.main, 1);
        });
        let spawn_task = spawn.finalize().unwrap();

        let mut physics = TaskBuilder::new(db);
        let positions = physics.query_mut::<Position>();
        let velocities = physics.query_mut::<Velocity>();
        let move_modifier = physics.get_modifier_for_table(particles);
        physics.set_name("physics_tick");
        physics.set_callback(move |args: &TaskArgs| {
            for &table in positions.tables() {
                let (Some(pos), Some(vel)) = (positions.get_mut(args.main, table), velocities.get_mut(args.main, table)) else {
                    continue;
                };
                for i in 0..pos.data.len().min(vel.data.len()) {
                    vel.data[i].dy += GRAVITY * 0.016;
                    pos.data[i].y += vel.data[i].dy * 0.016;
                    if pos.data[i].y <= GROUND_Y {
                        move_modifier.mark_move(args.main, i as u32, graveyard);
                    }
                }
            }
        });
        let physics_task = physics.finalize().unwrap();

        let mut driver = TaskBuilder::new(db);
        driver.set_name("scene_driver");
        driver.set_pinning(Pinning::Synchronous);
        driver.set_callback(scene_driver_task(self.gate.clone()));
        let driver_task = driver.finalize().unwrap();

        let mut on_init = TaskBuilder::new(db);
        on_init.set_name("scene_on_init");
        on_init.set_callback(gate_task(self.gate.clone(), 1, SceneState::NeedsInit, |_| log::info!("scene activated")));
        let on_init_task = on_init.finalize().unwrap();

        let mut on_uninit = TaskBuilder::new(db);
        on_uninit.set_name("scene_on_uninit");
        on_uninit.set_callback(gate_task(self.gate.clone(), 1, SceneState::NeedsUninit, |_| log::info!("scene deactivated")));
        let on_uninit_task = on_uninit.finalize().unwrap();

        vec![spawn_task, physics_task, driver_task, on_init_task, on_uninit_task]
    }
}

fn main() {
    gridkernel::init_default_logging();

    let mut app: App<()> = App::new(());
    app.register_module(Arc::new(ParticlesModule::new()));
    app.build(
        AppConfig {
            scheduler: SchedulerConfig { worker_count: 2 },
            ..Default::default()
        },
        &FullSchema,
    )
    .expect("scheduler setup");

    for frame in 0..5 {
        let dt = app.run_frame();
        log::info!("frame {frame} took {dt:?}");
    }
}
