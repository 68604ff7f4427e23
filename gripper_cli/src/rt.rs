//! Real-time scheduling helpers (Linux SCHED_FIFO / affinity / mlockall).

use crate::cli::RtLock;

#[cfg(target_os = "linux")]
pub fn setup_rt_once(rt: bool, prio: Option<i32>, lock: RtLock, rt_cpu: Option<usize>) {
    use libc::{
        CPU_SET, CPU_ZERO, SCHED_FIFO, sched_get_priority_max, sched_get_priority_min,
        sched_param, sched_setscheduler,
    };
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();

    if !rt {
        return;
    }

    // Lock process memory so control cycles never page-fault.
    fn apply_mem_lock(lock: RtLock) -> std::io::Result<()> {
        use libc::{MCL_CURRENT, MCL_FUTURE, mlockall};
        let flags = match lock {
            RtLock::None => return Ok(()),
            RtLock::Current => MCL_CURRENT,
            RtLock::All => MCL_CURRENT | MCL_FUTURE,
        };
        if unsafe { mlockall(flags) } != 0 {
            return Err(std::io::Error::last_os_error());
        }
        Ok(())
    }

    // SCHED_FIFO at the requested priority, clamped to the system range.
    fn apply_fifo_priority(prio: Option<i32>) -> std::io::Result<()> {
        let (min, max) = unsafe {
            let min = sched_get_priority_min(SCHED_FIFO);
            let max = sched_get_priority_max(SCHED_FIFO);
            if min < 0 || max < 0 { (1, 99) } else { (min, max) }
        };
        let param = sched_param {
            sched_priority: prio.unwrap_or(max).clamp(min, max),
        };
        if unsafe { sched_setscheduler(0, SCHED_FIFO, &param) } != 0 {
            return Err(std::io::Error::last_os_error());
        }
        Ok(())
    }

    // Pin to one CPU so the control loop does not migrate.
    fn apply_affinity(rt_cpu: Option<usize>) -> eyre::Result<()> {
        let online = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
        if online < 1 {
            eyre::bail!("_SC_NPROCESSORS_ONLN < 1");
        }
        let target = rt_cpu.unwrap_or(0);
        if target as libc::c_long >= online {
            eyre::bail!("requested CPU {target} >= online {online}");
        }
        let max_bits = std::mem::size_of::<libc::cpu_set_t>() * 8;
        if target >= max_bits {
            eyre::bail!("requested CPU {target} exceeds cpu_set_t capacity {max_bits}");
        }
        let mut desired: libc::cpu_set_t = unsafe { std::mem::zeroed() };
        unsafe {
            CPU_ZERO(&mut desired);
            CPU_SET(target, &mut desired);
        }
        let rc =
            unsafe { libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &desired) };
        if rc != 0 {
            return Err(eyre::eyre!(std::io::Error::last_os_error()));
        }
        Ok(())
    }

    RT_ONCE.get_or_init(|| {
        match apply_mem_lock(lock) {
            Ok(()) => match lock {
                RtLock::None => eprintln!("RT: memory locking disabled (none)"),
                RtLock::Current => eprintln!("RT: memory lock = current"),
                RtLock::All => eprintln!("RT: memory lock = all (current|future)"),
            },
            Err(err) => eprintln!(
                "Warning: mlockall failed: {err}; hint: needs CAP_IPC_LOCK (or root) and sufficient 'ulimit -l'"
            ),
        }
        if let Err(err) = apply_fifo_priority(prio) {
            let prio_dbg = prio
                .map(|p| p.to_string())
                .unwrap_or_else(|| "(max)".into());
            eprintln!(
                "Warning: sched_setscheduler(SCHED_FIFO, prio={prio_dbg}) failed: {err}; hint: needs CAP_SYS_NICE or root"
            );
        }
        if let Err(err) = apply_affinity(rt_cpu) {
            eprintln!("Warning: affinity not applied: {err}");
        }
    });
}

#[cfg(not(target_os = "linux"))]
pub fn setup_rt_once(rt: bool, _prio: Option<i32>, lock: RtLock, _rt_cpu: Option<usize>) {
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();
    if !rt {
        return;
    }
    RT_ONCE.get_or_init(|| {
        let _ = lock;
        eprintln!("Warning: real-time mode is only implemented on Linux; continuing without it");
    });
}
